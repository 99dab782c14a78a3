use chrono::{Duration, NaiveDate, TimeZone};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::calendar::{ScheduleFlags, ScheduleInterval};
use crate::scoring::{FactorInput, FactorScoreSet, ScheduleLoad, ScoreResult, Scorer};
use crate::timeline::grid::local_midnight;
use crate::weather::RawSample;

/// Days with fewer samples than this are only partly covered and dropped
pub const MIN_DAILY_SAMPLES: usize = 5;

/// Hour of day a daily summary is scored at
const DAILY_SCORING_HOUR: u32 = 12;

/// One day's aggregated forecast and score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyOutlook {
    pub date: NaiveDate,
    pub temp_max: Option<f64>,
    pub temp_min: Option<f64>,
    pub humidity_avg: Option<f64>,
    pub cloud_avg: Option<f64>,
    pub pressure_avg: Option<f64>,
    pub rain_total: f64,
    pub sample_count: usize,
    pub schedule: ScheduleFlags,
    pub factor_scores: FactorScoreSet,
    pub result: ScoreResult,
}

fn rounded_mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| (sum / n as f64).round())
}

fn extreme(values: impl Iterator<Item = f64>, pick: fn(f64, f64) -> f64) -> Option<f64> {
    values.reduce(pick)
}

/// Group samples by local date and score each fully covered day.
pub fn build_daily_outlook<Tz: TimeZone>(
    samples: &[RawSample],
    tz: &Tz,
    schedule: &[ScheduleInterval],
    aqi: Option<f64>,
    scorer: &Scorer,
) -> Vec<DailyOutlook> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&RawSample>> = BTreeMap::new();
    for sample in samples {
        let date = sample.timestamp.with_timezone(tz).date_naive();
        by_day.entry(date).or_default().push(sample);
    }

    by_day
        .into_iter()
        .filter(|(date, day)| {
            let keep = day.len() >= MIN_DAILY_SAMPLES;
            if !keep {
                log::debug!("Dropping {} from outlook: only {} samples", date, day.len());
            }
            keep
        })
        .map(|(date, day)| summarize_day(date, &day, tz, schedule, aqi, scorer))
        .collect()
}

fn summarize_day<Tz: TimeZone>(
    date: NaiveDate,
    day: &[&RawSample],
    tz: &Tz,
    schedule: &[ScheduleInterval],
    aqi: Option<f64>,
    scorer: &Scorer,
) -> DailyOutlook {
    let temps = || day.iter().filter_map(|s| s.temperature);
    let temp_max = extreme(temps(), f64::max);
    let temp_min = extreme(temps(), f64::min);

    let day_start = local_midnight(date, tz);
    let day_end = date
        .succ_opt()
        .map(|next| local_midnight(next, tz))
        .unwrap_or(day_start + Duration::days(1));

    let summary = RawSample {
        temperature: match (temp_max, temp_min) {
            (Some(max), Some(min)) => Some((max + min) / 2.0),
            _ => None,
        },
        humidity: rounded_mean(day.iter().filter_map(|s| s.humidity)),
        pressure: rounded_mean(day.iter().filter_map(|s| s.pressure)),
        cloud_coverage: rounded_mean(day.iter().filter_map(|s| s.cloud_coverage)),
        rain_volume: Some(day.iter().filter_map(|s| s.rain_volume).sum()),
        sunrise_hour: day.iter().find_map(|s| s.sunrise_hour),
        sunset_hour: day.iter().find_map(|s| s.sunset_hour),
        ..RawSample::empty(day_start + Duration::hours(i64::from(DAILY_SCORING_HOUR)))
    };

    let flags = ScheduleFlags::for_window(schedule, day_start, day_end);
    let mut input = FactorInput::new(&summary, DAILY_SCORING_HOUR, ScheduleLoad::Day(flags));
    input.temperature_range = temp_max.zip(temp_min);
    input.aqi = aqi;
    input.outdoor_exposure = flags.has_outdoor_activities;

    let (factor_scores, result) = scorer.score(&input);

    DailyOutlook {
        date,
        temp_max,
        temp_min,
        humidity_avg: summary.humidity,
        cloud_avg: summary.cloud_coverage,
        pressure_avg: summary.pressure,
        rain_total: summary.rain_volume.unwrap_or(0.0),
        sample_count: day.len(),
        schedule: flags,
        factor_scores,
        result,
    }
}
