use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::{EvaluationTier, FactorScoreSet};
use crate::timeline::grid::{GridHour, HourGrid, TIMELINE_HOURS};
use crate::weather::RawSample;

/// One scored hour.
///
/// `total_score`, `factor_scores` and `raw_sample` are `None` together when
/// the hour had no usable data. This is also the on-disk history record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredHour {
    pub timestamp: DateTime<Utc>,
    pub hour: u32,
    pub total_score: Option<u32>,
    pub factor_scores: Option<FactorScoreSet>,
    pub raw_sample: Option<RawSample>,
    pub temp_delta_12h: Option<f64>,
    pub pressure_delta_12h: Option<f64>,
}

impl ScoredHour {
    /// An hour with no data.
    pub fn empty(timestamp: DateTime<Utc>, hour: u32) -> Self {
        Self {
            timestamp,
            hour,
            total_score: None,
            factor_scores: None,
            raw_sample: None,
            temp_delta_12h: None,
            pressure_delta_12h: None,
        }
    }

    pub fn has_data(&self) -> bool {
        self.total_score.is_some() && self.raw_sample.is_some()
    }

    pub fn tier(&self) -> Option<EvaluationTier> {
        self.total_score.map(EvaluationTier::from_score)
    }
}

/// Exactly 72 scored hours, one per grid slot, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Timeline {
    hours: Vec<ScoredHour>,
}

impl Timeline {
    /// Build one entry per grid hour.
    pub fn from_grid(grid: &HourGrid, f: impl FnMut(&GridHour) -> ScoredHour) -> Self {
        let hours: Vec<ScoredHour> = grid.iter().map(f).collect();
        debug_assert_eq!(hours.len(), TIMELINE_HOURS);
        Self { hours }
    }

    /// A timeline with no data at all.
    pub fn empty(grid: &HourGrid) -> Self {
        Self::from_grid(grid, |slot| ScoredHour::empty(slot.timestamp, slot.hour))
    }

    pub fn hours(&self) -> &[ScoredHour] {
        &self.hours
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredHour> {
        self.hours.iter()
    }

    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ScoredHour> {
        self.hours.get(index)
    }

    /// The hour containing `now`, if it is on the timeline.
    pub fn at(&self, now: DateTime<Utc>) -> Option<&ScoredHour> {
        self.hours
            .iter()
            .rev()
            .find(|h| h.timestamp <= now)
            .filter(|h| now - h.timestamp < chrono::Duration::hours(1))
    }

    pub fn data_count(&self) -> usize {
        self.hours.iter().filter(|h| h.has_data()).count()
    }
}
