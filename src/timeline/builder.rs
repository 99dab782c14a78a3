use chrono::{DateTime, Utc};

use crate::calendar::{has_outdoor_exposure, is_busy, ScheduleInterval};
use crate::scoring::{FactorInput, ScheduleLoad, Scorer};
use crate::timeline::grid::HourGrid;
use crate::timeline::interpolate::interpolate_at;
use crate::timeline::types::{ScoredHour, Timeline};
use crate::weather::RawSample;

/// Hours looked back for the trailing deltas, not counting the hour itself
pub const TRAILING_WINDOW_HOURS: usize = 12;

/// One resolved sample (or none) per grid hour.
pub fn resolve_samples(grid: &HourGrid, samples: &[RawSample]) -> Vec<Option<RawSample>> {
    grid.iter()
        .map(|slot| interpolate_at(samples, slot.timestamp))
        .collect()
}

/// Max minus min over `values[index - window ..= index]`, skipping gaps.
/// Zero when the window holds no values.
pub fn trailing_delta(values: &[Option<f64>], index: usize, window: usize) -> f64 {
    let from = index.saturating_sub(window);
    let present = values[from..=index].iter().flatten().copied();

    let (min, max) = present.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min.is_finite() && max.is_finite() {
        max - min
    } else {
        0.0
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Score a resolved sample for one grid hour.
#[allow(clippy::too_many_arguments)]
fn score_hour(
    timestamp: DateTime<Utc>,
    hour: u32,
    sample: &RawSample,
    temp_delta: Option<f64>,
    pressure_delta: Option<f64>,
    schedule: &[ScheduleInterval],
    aqi: Option<f64>,
    scorer: &Scorer,
) -> ScoredHour {
    let end = timestamp + chrono::Duration::hours(1);
    let mut input = FactorInput::new(
        sample,
        hour,
        ScheduleLoad::Hour {
            busy: is_busy(schedule, timestamp, end),
        },
    );
    input.temp_delta_12h = temp_delta;
    input.pressure_delta_12h = pressure_delta;
    input.aqi = aqi;
    input.outdoor_exposure = has_outdoor_exposure(schedule, timestamp, end);

    let (scores, result) = scorer.score(&input);
    if result.incomplete {
        log::debug!("Hour {} scored with missing factors", timestamp);
    }

    ScoredHour {
        timestamp,
        hour,
        total_score: Some(result.total_score),
        factor_scores: Some(scores),
        raw_sample: Some(sample.clone()),
        temp_delta_12h: temp_delta.map(round_tenth),
        pressure_delta_12h: pressure_delta.map(round_tenth),
    }
}

/// Build the 72-hour scored timeline.
///
/// Every grid hour gets an entry. Hours where no sample can be resolved are
/// present with every score left as `None`.
pub fn build_hourly_timeline(
    grid: &HourGrid,
    samples: &[RawSample],
    schedule: &[ScheduleInterval],
    aqi: Option<f64>,
    scorer: &Scorer,
) -> Timeline {
    let resolved = resolve_samples(grid, samples);
    let temps: Vec<Option<f64>> = resolved
        .iter()
        .map(|s| s.as_ref().and_then(|s| s.temperature))
        .collect();
    let pressures: Vec<Option<f64>> = resolved
        .iter()
        .map(|s| s.as_ref().and_then(|s| s.pressure))
        .collect();

    let timeline = Timeline::from_grid(grid, |slot| match &resolved[slot.index] {
        Some(sample) => score_hour(
            slot.timestamp,
            slot.hour,
            sample,
            // A delta only means something when the hour has its own value
            sample
                .temperature
                .map(|_| trailing_delta(&temps, slot.index, TRAILING_WINDOW_HOURS)),
            sample
                .pressure
                .map(|_| trailing_delta(&pressures, slot.index, TRAILING_WINDOW_HOURS)),
            schedule,
            aqi,
            scorer,
        ),
        None => ScoredHour::empty(slot.timestamp, slot.hour),
    });

    log::debug!(
        "Built timeline: {} of {} hours with data",
        timeline.data_count(),
        timeline.len()
    );
    timeline
}
