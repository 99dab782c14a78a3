use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::timeline::ScoredHour;

/// Mean difference beyond which a trend is up or down
const TREND_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

/// Mean score of one local day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyScore {
    pub date: NaiveDate,
    pub average: u32,
    pub hours: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryStats {
    pub average: u32,
    pub max: u32,
    pub min: u32,
    pub latest: u32,
    pub trend: Trend,
    pub daily: Vec<DailyScore>,
}

/// Compare the mean of the last three values with the three before them.
pub fn trend(values: &[u32]) -> Trend {
    if values.len() < 2 {
        return Trend::Stable;
    }
    let mean = |xs: &[u32]| xs.iter().map(|&x| f64::from(x)).sum::<f64>() / xs.len() as f64;

    let split = values.len().saturating_sub(3);
    let recent = mean(&values[split..]);
    let previous_slice = &values[split.saturating_sub(3)..split];
    let previous = if previous_slice.is_empty() {
        recent
    } else {
        mean(previous_slice)
    };

    let diff = recent - previous;
    if diff > TREND_THRESHOLD {
        Trend::Up
    } else if diff < -TREND_THRESHOLD {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// Group scored hours by local date and average each day.
pub fn daily_means<Tz: TimeZone>(hours: &[ScoredHour], tz: &Tz) -> Vec<DailyScore> {
    let mut by_day: BTreeMap<NaiveDate, Vec<u32>> = BTreeMap::new();
    for hour in hours {
        if let Some(score) = hour.total_score {
            let date = hour.timestamp.with_timezone(tz).date_naive();
            by_day.entry(date).or_default().push(score);
        }
    }
    by_day
        .into_iter()
        .map(|(date, scores)| {
            let sum: u32 = scores.iter().sum();
            DailyScore {
                date,
                average: (f64::from(sum) / scores.len() as f64).round() as u32,
                hours: scores.len(),
            }
        })
        .collect()
}

/// Statistics over the daily means of the last `days` days up to `now`.
/// `None` when nothing in that window has a score.
pub fn compute_stats<Tz: TimeZone>(
    hours: &[ScoredHour],
    tz: &Tz,
    now: DateTime<Utc>,
    days: i64,
) -> Option<HistoryStats> {
    let since = now - Duration::days(days);
    let window: Vec<ScoredHour> = hours
        .iter()
        .filter(|h| h.timestamp >= since && h.timestamp <= now)
        .cloned()
        .collect();

    let daily = daily_means(&window, tz);
    let values: Vec<u32> = daily.iter().map(|d| d.average).collect();
    let latest = *values.last()?;
    let sum: u32 = values.iter().sum();

    Some(HistoryStats {
        average: (f64::from(sum) / values.len() as f64).round() as u32,
        max: values.iter().copied().max().unwrap_or(latest),
        min: values.iter().copied().min().unwrap_or(latest),
        latest,
        trend: trend(&values),
        daily,
    })
}
