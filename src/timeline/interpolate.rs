//! Resolve one sample at an arbitrary instant from a sparse sample list.

use chrono::{DateTime, Utc};

use crate::weather::RawSample;

/// Latest sample at or before `target` and earliest at or after it.
///
/// The input does not need to be sorted. Among samples sharing a timestamp
/// the first one listed wins.
pub fn find_neighbors(
    samples: &[RawSample],
    target: DateTime<Utc>,
) -> (Option<&RawSample>, Option<&RawSample>) {
    let mut before: Option<&RawSample> = None;
    let mut after: Option<&RawSample> = None;

    for sample in samples {
        if sample.timestamp <= target && before.map_or(true, |b| sample.timestamp > b.timestamp) {
            before = Some(sample);
        }
        if sample.timestamp >= target && after.map_or(true, |a| sample.timestamp < a.timestamp) {
            after = Some(sample);
        }
    }

    (before, after)
}

fn lerp(a: Option<f64>, b: Option<f64>, t: f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a * (1.0 - t) + b * t),
        _ => None,
    }
}

/// Blend two samples at `target`. Continuous fields are interpolated by
/// time fraction; stepped fields come from `before`.
fn blend(before: &RawSample, after: &RawSample, target: DateTime<Utc>) -> RawSample {
    let span = (after.timestamp - before.timestamp).num_milliseconds() as f64;
    let t = (target - before.timestamp).num_milliseconds() as f64 / span;

    RawSample {
        timestamp: target,
        temperature: lerp(before.temperature, after.temperature, t),
        humidity: lerp(before.humidity, after.humidity, t),
        pressure: lerp(before.pressure, after.pressure, t),
        wind_speed: lerp(before.wind_speed, after.wind_speed, t),
        feels_like: lerp(before.feels_like, after.feels_like, t),
        visibility: lerp(before.visibility, after.visibility, t),
        cloud_coverage: before.cloud_coverage,
        rain_volume: before.rain_volume,
        description: before.description.clone(),
        sunrise_hour: before.sunrise_hour,
        sunset_hour: before.sunset_hour,
    }
}

/// The sample at `target`, or `None` when nothing can be resolved or the
/// result carries no scored signal.
pub fn interpolate_at(samples: &[RawSample], target: DateTime<Utc>) -> Option<RawSample> {
    let resolved = match find_neighbors(samples, target) {
        (Some(before), Some(after)) if before.timestamp == after.timestamp => before.at(target),
        (Some(before), Some(after)) => blend(before, after, target),
        (Some(only), None) | (None, Some(only)) => only.at(target),
        (None, None) => return None,
    };

    if !resolved.is_finite() {
        log::debug!("Discarding non-finite sample at {}", target);
        return None;
    }
    if !resolved.has_measurements() {
        log::debug!("No scored signal resolved at {}", target);
        return None;
    }
    Some(resolved)
}
