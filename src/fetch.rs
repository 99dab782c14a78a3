use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Serialize;
use std::fmt;

use crate::calendar::{fetch_schedule_intervals, ScheduleFlags, ScheduleInterval};
use crate::config::Location;
use crate::history::{latest_good_boundary, reconcile_and_persist, supplement_with_history, HistoryStore};
use crate::scoring::{analyze, recommendations, AnalysisContext, RiskNote, ScoreResult, Scorer, ScoringConfig};
use crate::timeline::{build_daily_outlook, build_hourly_timeline, DailyOutlook, HourGrid, Timeline};
use crate::weather::{fetch_aqi, fetch_sparse_weather_samples, RawSample};

/// Credentials and settings for one round of provider calls.
#[derive(Debug, Clone, Copy)]
pub struct Providers<'a> {
    pub weather_key: &'a str,
    pub aqi_token: Option<&'a str>,
    pub calendar_token: Option<&'a str>,
    pub location: Location,
    pub aqi_default: f64,
}

/// Everything the providers returned, with failures already replaced by
/// defaults.
#[derive(Debug, Clone, Default)]
pub struct ForecastInputs {
    pub samples: Vec<RawSample>,
    pub aqi: f64,
    pub schedule: Vec<ScheduleInterval>,
}

/// Neither the weather provider nor the history store had anything for the
/// requested window.
#[derive(Debug)]
pub struct NoDataError;

impl fmt::Display for NoDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No weather data from the provider and no recorded history for this window"
        )
    }
}

impl std::error::Error for NoDataError {}

/// Call weather, then AQI, then calendar. Never fails: each provider error
/// is logged and replaced by its fallback.
pub async fn fetch_inputs<Tz: TimeZone>(
    client: &Client,
    providers: &Providers<'_>,
    tz: &Tz,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> ForecastInputs {
    let samples = match fetch_sparse_weather_samples(
        client,
        providers.weather_key,
        &providers.location,
        tz,
        start,
        end,
    )
    .await
    {
        Ok(samples) => {
            log::info!("Weather: {} samples", samples.len());
            samples
        }
        Err(e) => {
            log::warn!("Weather fetch failed: {}", e);
            Vec::new()
        }
    };

    let aqi = match providers.aqi_token {
        Some(token) => match fetch_aqi(client, token, &providers.location).await {
            Ok(aqi) => {
                log::info!("AQI: {}", aqi);
                aqi
            }
            Err(e) => {
                log::warn!(
                    "AQI fetch failed: {}; using default {}",
                    e,
                    providers.aqi_default
                );
                providers.aqi_default
            }
        },
        None => {
            log::debug!("No AQI token; using default {}", providers.aqi_default);
            providers.aqi_default
        }
    };

    let schedule = match providers.calendar_token {
        Some(token) => match fetch_schedule_intervals(client, token, tz, start, end).await {
            Ok(intervals) => {
                log::info!("Calendar: {} events", intervals.len());
                intervals
            }
            Err(e) => {
                log::warn!("Calendar fetch failed: {}; assuming a clear schedule", e);
                Vec::new()
            }
        },
        None => {
            log::debug!("No calendar token; assuming a clear schedule");
            Vec::new()
        }
    };

    ForecastInputs {
        samples,
        aqi,
        schedule,
    }
}

/// Analysis of the hour containing "now".
#[derive(Debug, Clone, Serialize)]
pub struct CurrentCondition {
    pub timestamp: DateTime<Utc>,
    pub result: ScoreResult,
    pub sample: RawSample,
    pub schedule: ScheduleFlags,
    pub risks: Vec<RiskNote>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    pub generated_at: DateTime<Utc>,
    pub aqi: f64,
    pub current: Option<CurrentCondition>,
    pub timeline: Timeline,
    pub daily: Vec<DailyOutlook>,
}

/// Score the 72-hour window around `now`, merge it into `store` and build
/// the report from what the store holds afterwards.
///
/// Fails with [`NoDataError`] when the inputs carry no measurements and
/// nothing in the window was recorded before.
pub fn run_forecast<S: HistoryStore, Tz: TimeZone>(
    store: &mut S,
    inputs: &ForecastInputs,
    scoring: &ScoringConfig,
    now: &DateTime<Tz>,
) -> Result<ForecastReport> {
    let tz = now.timezone();
    let now_utc = now.with_timezone(&Utc);
    let grid = HourGrid::starting_yesterday(now);

    let recorded = store.read(grid.start(), grid.end())?;
    let live = inputs.samples.iter().any(RawSample::has_measurements);
    if !live && !recorded.iter().any(|h| h.has_data()) {
        return Err(NoDataError.into());
    }

    let samples = supplement_with_history(&inputs.samples, &recorded, now_utc);
    let hourly = Scorer::hourly(scoring);
    let fresh = build_hourly_timeline(&grid, &samples, &inputs.schedule, Some(inputs.aqi), &hourly);

    let boundary = latest_good_boundary(&grid, &inputs.samples);
    let timeline = reconcile_and_persist(store, &grid, &fresh, boundary, now_utc)?;

    let daily = build_daily_outlook(
        &inputs.samples,
        &tz,
        &inputs.schedule,
        Some(inputs.aqi),
        &Scorer::daily(scoring),
    );

    let current = current_condition(&timeline, &grid, inputs, &hourly, now_utc);

    Ok(ForecastReport {
        generated_at: now_utc,
        aqi: inputs.aqi,
        current,
        timeline,
        daily,
    })
}

fn current_condition(
    timeline: &Timeline,
    grid: &HourGrid,
    inputs: &ForecastInputs,
    scorer: &Scorer,
    now: DateTime<Utc>,
) -> Option<CurrentCondition> {
    let hour = timeline.at(now)?;
    let scores = hour.factor_scores.as_ref()?;
    let sample = hour.raw_sample.as_ref()?;
    let result = scorer.compute_total(scores);

    // Schedule flags cover the whole local day of the current hour
    let date = grid.hours().get(grid.index_of(hour.timestamp)?)?.date;
    let mut day = grid.iter().filter(|g| g.date == date);
    let first = day.next()?;
    let day_end = day.last().unwrap_or(first).end();
    let flags = ScheduleFlags::for_window(&inputs.schedule, first.timestamp, day_end);

    let risks = analyze(
        scores,
        &AnalysisContext {
            sample,
            aqi: Some(inputs.aqi),
            flags,
        },
    );
    let recommendations = recommendations(result.tier, &risks);

    Some(CurrentCondition {
        timestamp: hour.timestamp,
        result,
        sample: sample.clone(),
        schedule: flags,
        risks,
        recommendations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryStore;
    use crate::timeline::TIMELINE_HOURS;
    use chrono::{Duration, FixedOffset};

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn sample(ts: DateTime<Utc>, temperature: f64) -> RawSample {
        RawSample {
            temperature: Some(temperature),
            humidity: Some(50.0),
            pressure: Some(1015.0),
            cloud_coverage: Some(20.0),
            ..RawSample::empty(ts)
        }
    }

    /// Three-hourly samples covering the whole grid around `now`.
    fn inputs_for(now: &DateTime<FixedOffset>, temperature: f64) -> ForecastInputs {
        let grid = HourGrid::starting_yesterday(now);
        let samples = (0..=TIMELINE_HOURS as i64 / 3)
            .map(|i| sample(grid.start() + Duration::hours(i * 3), temperature))
            .collect();
        ForecastInputs {
            samples,
            aqi: 30.0,
            schedule: Vec::new(),
        }
    }

    #[test]
    fn test_run_forecast_full_window() {
        let now = jst().with_ymd_and_hms(2026, 5, 10, 14, 20, 0).unwrap();
        let mut store = MemoryStore::default();
        let report =
            run_forecast(&mut store, &inputs_for(&now, 18.0), &ScoringConfig::default(), &now)
                .unwrap();

        assert_eq!(report.timeline.len(), TIMELINE_HOURS);
        assert_eq!(report.timeline.data_count(), TIMELINE_HOURS);
        assert_eq!(store.history().len(), TIMELINE_HOURS);

        let current = report.current.unwrap();
        assert_eq!(
            current.timestamp,
            jst().with_ymd_and_hms(2026, 5, 10, 14, 0, 0).unwrap()
        );
        assert!(current.schedule.is_clear());
        assert!(!current.recommendations.is_empty());
        assert!(!report.daily.is_empty());
    }

    #[test]
    fn test_run_forecast_without_any_data() {
        let now = jst().with_ymd_and_hms(2026, 5, 10, 14, 20, 0).unwrap();
        let mut store = MemoryStore::default();
        let err = run_forecast(
            &mut store,
            &ForecastInputs::default(),
            &ScoringConfig::default(),
            &now,
        )
        .unwrap_err();
        assert!(err.downcast_ref::<NoDataError>().is_some());
        assert_eq!(store.saves(), 0);
    }

    #[test]
    fn test_second_run_keeps_recorded_past() {
        let now = jst().with_ymd_and_hms(2026, 5, 10, 14, 20, 0).unwrap();
        let mut store = MemoryStore::default();
        let scoring = ScoringConfig::default();
        let first = run_forecast(&mut store, &inputs_for(&now, 18.0), &scoring, &now).unwrap();

        // Later run: the provider only covers from now on, and it is much colder
        let later = now + Duration::hours(1);
        let mut inputs = inputs_for(&later, -10.0);
        inputs.samples.retain(|s| s.timestamp >= later.with_timezone(&Utc));
        let second = run_forecast(&mut store, &inputs, &scoring, &later).unwrap();

        // Yesterday's hours come from the store untouched
        assert_eq!(first.timeline.get(3), second.timeline.get(3));
        // Hours after the new boundary take the colder forecast
        let last = second.timeline.get(TIMELINE_HOURS - 1).unwrap();
        assert_eq!(
            last.raw_sample.as_ref().and_then(|s| s.temperature),
            Some(-10.0)
        );
    }

    #[test]
    fn test_history_alone_is_enough() {
        let now = jst().with_ymd_and_hms(2026, 5, 10, 14, 20, 0).unwrap();
        let mut store = MemoryStore::default();
        let scoring = ScoringConfig::default();
        run_forecast(&mut store, &inputs_for(&now, 18.0), &scoring, &now).unwrap();

        let report = run_forecast(&mut store, &ForecastInputs::default(), &scoring, &now).unwrap();
        assert!(report.timeline.data_count() > 0);
    }
}
