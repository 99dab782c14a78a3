//! Offline demo: synthetic provider data run through the real pipeline
//! against an in-memory store.

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use std::f64::consts::PI;

use crate::calendar::ScheduleInterval;
use crate::fetch::{run_forecast, ForecastInputs, ForecastReport};
use crate::history::MemoryStore;
use crate::scoring::ScoringConfig;
use crate::timeline::HourGrid;
use crate::weather::RawSample;

const DEMO_AQI: f64 = 42.0;

/// A plausible three-hourly sample: warmest mid-afternoon, a slow pressure
/// dip on the second day.
fn synthetic_sample(ts: DateTime<Utc>, local_hour: u32, step: i64) -> RawSample {
    let phase = (f64::from(local_hour) - 15.0) / 24.0 * 2.0 * PI;
    let temperature = 16.0 + 7.0 * phase.cos();
    let dip = (step as f64 - 12.0) / 6.0;
    let pressure = 1013.0 - 9.0 * (-dip * dip).exp();
    let cloud = (30.0 + 10.0 * step as f64 % 70.0).min(100.0);

    RawSample {
        temperature: Some((temperature * 10.0).round() / 10.0),
        humidity: Some(55.0 + 3.0 * (step % 5) as f64),
        pressure: Some((pressure * 10.0).round() / 10.0),
        cloud_coverage: Some(cloud),
        wind_speed: Some(2.5),
        feels_like: Some((temperature - 1.0).round()),
        visibility: Some(10000.0),
        rain_volume: Some(if cloud > 80.0 { 1.2 } else { 0.0 }),
        description: Some(if cloud > 80.0 { "light rain" } else { "scattered clouds" }.to_string()),
        sunrise_hour: Some(6),
        sunset_hour: Some(18),
        ..RawSample::empty(ts)
    }
}

/// Provider-shaped inputs covering the grid around `now`.
pub fn demo_inputs<Tz: TimeZone>(now: &DateTime<Tz>) -> ForecastInputs {
    let tz = now.timezone();
    let grid = HourGrid::starting_yesterday(now);

    let samples = (-1..=25)
        .map(|step| {
            let ts = grid.start() + Duration::hours(step * 3);
            let hour = ts.with_timezone(&tz).hour();
            synthetic_sample(ts, hour, step)
        })
        .collect();

    // Today 10:00-11:00 meeting, tomorrow 14:00-16:00 outdoors
    let today = grid.start() + Duration::hours(24);
    let schedule = vec![
        ScheduleInterval::new(
            today + Duration::hours(10),
            today + Duration::hours(11),
            "Weekly meeting",
            "",
        ),
        ScheduleInterval::new(
            today + Duration::hours(38),
            today + Duration::hours(40),
            "Outdoor walk",
            "",
        ),
    ];

    ForecastInputs {
        samples,
        aqi: DEMO_AQI,
        schedule,
    }
}

/// Run the forecast pipeline on demo data. Returns the report and the store
/// holding what was recorded.
pub fn run_demo<Tz: TimeZone>(
    now: &DateTime<Tz>,
    scoring: &ScoringConfig,
) -> Result<(ForecastReport, MemoryStore)> {
    let mut store = MemoryStore::default();
    let report = run_forecast(&mut store, &demo_inputs(now), scoring, now)?;
    Ok((report, store))
}
