//! Merging fresh timelines into recorded history.
//!
//! Hours before the boundary are confirmed past. Once such an hour has data
//! in the store, a later run can never replace it, even with a different
//! score or with a gap. From the boundary on, the fresh value always wins.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::storage::HistoryStore;
use super::types::PersistedHistory;
use crate::timeline::{HourGrid, ScoredHour, Timeline};
use crate::weather::RawSample;

/// Outcome of one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub written: usize,
    /// Fresh hours skipped because the recorded hour is protected
    pub protected: usize,
    pub pruned: usize,
}

/// Start of the hour holding the earliest real provider sample.
///
/// Everything before it was not covered by this run's live feed; everything
/// from it on is refreshed. When the provider returned nothing, the whole
/// grid counts as past.
pub fn latest_good_boundary(grid: &HourGrid, provider_samples: &[RawSample]) -> DateTime<Utc> {
    provider_samples
        .iter()
        .filter(|s| s.has_measurements())
        .map(|s| s.timestamp)
        .min()
        .map(|earliest| grid.floor(earliest))
        .unwrap_or_else(|| grid.end())
}

/// Merge `fresh` into `history` in place.
pub fn merge_hours(
    history: &mut PersistedHistory,
    fresh: &[ScoredHour],
    boundary: DateTime<Utc>,
) -> MergeSummary {
    let mut summary = MergeSummary::default();
    for hour in fresh {
        let protected = hour.timestamp < boundary
            && history.get(hour.timestamp).is_some_and(ScoredHour::has_data);
        if protected {
            summary.protected += 1;
        } else {
            history.insert(hour.clone());
            summary.written += 1;
        }
    }
    summary
}

/// Provider samples plus recorded samples from hours already past.
///
/// A recorded sample replaces a provider sample at the same timestamp.
pub fn supplement_with_history(
    provider: &[RawSample],
    recorded: &[ScoredHour],
    now: DateTime<Utc>,
) -> Vec<RawSample> {
    let mut by_time: BTreeMap<DateTime<Utc>, RawSample> = provider
        .iter()
        .map(|s| (s.timestamp, s.clone()))
        .collect();

    let mut reused = 0;
    for hour in recorded.iter().filter(|h| h.timestamp < now && h.has_data()) {
        if let Some(sample) = &hour.raw_sample {
            by_time.insert(sample.timestamp, sample.clone());
            reused += 1;
        }
    }
    if reused > 0 {
        log::debug!("Reusing {} recorded samples for past hours", reused);
    }

    by_time.into_values().collect()
}

/// Lay recorded hours onto the grid. Hours missing from the store are empty.
pub fn project_timeline(grid: &HourGrid, recorded: &[ScoredHour]) -> Timeline {
    let by_time: BTreeMap<DateTime<Utc>, &ScoredHour> =
        recorded.iter().map(|h| (h.timestamp, h)).collect();
    Timeline::from_grid(grid, |slot| match by_time.get(&slot.timestamp) {
        Some(hour) => (*hour).clone(),
        None => ScoredHour::empty(slot.timestamp, slot.hour),
    })
}

/// Persist a fresh timeline and return the 72-hour view read back from the
/// store.
pub fn reconcile_and_persist<S: HistoryStore>(
    store: &mut S,
    grid: &HourGrid,
    fresh: &Timeline,
    boundary: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Timeline> {
    let summary = store.write(fresh.hours(), boundary, now)?;
    log::info!(
        "History updated: {} written, {} protected, {} pruned",
        summary.written,
        summary.protected,
        summary.pruned
    );

    let recorded = store.read(grid.start(), grid.end())?;
    Ok(project_timeline(grid, &recorded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryStore;
    use crate::timeline::TIMELINE_HOURS;
    use chrono::{Duration, TimeZone};

    fn grid() -> HourGrid {
        HourGrid::starting_at(Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap(), &Utc)
    }

    fn scored(ts: DateTime<Utc>, score: u32) -> ScoredHour {
        ScoredHour {
            total_score: Some(score),
            raw_sample: Some(RawSample {
                temperature: Some(f64::from(score) / 4.0),
                ..RawSample::empty(ts)
            }),
            ..ScoredHour::empty(ts, 0)
        }
    }

    fn timeline_with(grid: &HourGrid, score: Option<u32>) -> Timeline {
        Timeline::from_grid(grid, |slot| match score {
            Some(s) => scored(slot.timestamp, s),
            None => ScoredHour::empty(slot.timestamp, slot.hour),
        })
    }

    #[test]
    fn test_boundary_is_earliest_sample_floored() {
        let grid = grid();
        let samples = vec![
            RawSample {
                temperature: Some(10.0),
                ..RawSample::empty(grid.start() + Duration::minutes(30 * 60 + 20))
            },
            RawSample {
                temperature: Some(11.0),
                ..RawSample::empty(grid.start() + Duration::hours(33))
            },
            // No measurements; does not count
            RawSample::empty(grid.start() + Duration::hours(3)),
        ];
        assert_eq!(
            latest_good_boundary(&grid, &samples),
            grid.start() + Duration::hours(30)
        );
    }

    #[test]
    fn test_boundary_without_samples_is_grid_end() {
        let grid = grid();
        assert_eq!(latest_good_boundary(&grid, &[]), grid.end());
    }

    #[test]
    fn test_past_data_survives_fresh_gap() {
        let grid = grid();
        let t = grid.start() + Duration::hours(5);
        let mut history = PersistedHistory::default();
        history.insert(scored(t, 72));

        let fresh = vec![ScoredHour::empty(t, 5)];
        let summary = merge_hours(&mut history, &fresh, t + Duration::hours(1));

        assert_eq!(summary.protected, 1);
        assert_eq!(history.get(t), Some(&scored(t, 72)));
    }

    #[test]
    fn test_past_data_survives_fresh_value() {
        let grid = grid();
        let t = grid.start() + Duration::hours(5);
        let mut history = PersistedHistory::default();
        history.insert(scored(t, 72));

        merge_hours(&mut history, &[scored(t, 40)], t + Duration::hours(1));
        assert_eq!(history.get(t).unwrap().total_score, Some(72));
    }

    #[test]
    fn test_past_gap_is_filled() {
        let grid = grid();
        let t = grid.start() + Duration::hours(5);
        let mut history = PersistedHistory::default();
        history.insert(ScoredHour::empty(t, 5));

        merge_hours(&mut history, &[scored(t, 40)], t + Duration::hours(1));
        assert_eq!(history.get(t).unwrap().total_score, Some(40));
    }

    #[test]
    fn test_boundary_itself_is_overwritable() {
        let grid = grid();
        let t = grid.start() + Duration::hours(5);
        let mut history = PersistedHistory::default();
        history.insert(scored(t, 72));

        let summary = merge_hours(&mut history, &[ScoredHour::empty(t, 5)], t);
        assert_eq!(summary.written, 1);
        assert!(!history.get(t).unwrap().has_data());
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let grid = grid();
        let now = grid.start() + Duration::hours(30);
        let boundary = grid.start() + Duration::hours(24);

        let mut seeded = PersistedHistory::default();
        for h in 0..10 {
            seeded.insert(scored(grid.start() + Duration::hours(h), 90));
        }
        let mut store = MemoryStore::with_history(seeded, Duration::days(30));
        let fresh = timeline_with(&grid, Some(55));

        let first = reconcile_and_persist(&mut store, &grid, &fresh, boundary, now).unwrap();
        let after_first = store.history().clone();
        let second = reconcile_and_persist(&mut store, &grid, &fresh, boundary, now).unwrap();

        assert_eq!(store.history(), &after_first);
        assert_eq!(first, second);
        assert_eq!(first.len(), TIMELINE_HOURS);
        // Seeded past hours kept, the rest from the fresh run
        assert_eq!(first.get(3).unwrap().total_score, Some(90));
        assert_eq!(first.get(12).unwrap().total_score, Some(55));
        assert_eq!(first.get(40).unwrap().total_score, Some(55));
    }

    #[test]
    fn test_recorded_forecast_hour_is_refreshed() {
        let grid = grid();
        let now = grid.start() + Duration::hours(30);

        // An earlier run recorded hours 0..72, including forecast hours
        let mut seeded = PersistedHistory::default();
        for h in 0..TIMELINE_HOURS as i64 {
            seeded.insert(scored(grid.start() + Duration::hours(h), 90));
        }
        let mut store = MemoryStore::with_history(seeded, Duration::days(30));

        // The live feed now starts at hour 30 and runs past the grid end
        let provider: Vec<RawSample> = (10..=26)
            .map(|i| RawSample {
                temperature: Some(12.0),
                ..RawSample::empty(grid.start() + Duration::hours(i * 3))
            })
            .collect();
        let boundary = latest_good_boundary(&grid, &provider);
        assert_eq!(boundary, grid.start() + Duration::hours(30));

        let fresh = timeline_with(&grid, Some(55));
        let merged = reconcile_and_persist(&mut store, &grid, &fresh, boundary, now).unwrap();

        // Confirmed past kept, covered hours take the new forecast
        assert_eq!(merged.get(29).unwrap().total_score, Some(90));
        assert_eq!(merged.get(30).unwrap().total_score, Some(55));
        assert_eq!(merged.get(40).unwrap().total_score, Some(55));
        assert_eq!(merged.get(71).unwrap().total_score, Some(55));
    }

    #[test]
    fn test_projection_fills_missing_hours() {
        let grid = grid();
        let recorded = vec![scored(grid.start() + Duration::hours(2), 66)];
        let timeline = project_timeline(&grid, &recorded);
        assert_eq!(timeline.len(), TIMELINE_HOURS);
        assert_eq!(timeline.data_count(), 1);
        assert_eq!(timeline.get(2).unwrap().total_score, Some(66));
        assert_eq!(timeline.get(3).unwrap().hour, 3);
    }

    #[test]
    fn test_supplement_prefers_recorded_past() {
        let base = grid().start();
        let provider = vec![
            RawSample {
                temperature: Some(1.0),
                ..RawSample::empty(base)
            },
            RawSample {
                temperature: Some(2.0),
                ..RawSample::empty(base + Duration::hours(6))
            },
        ];
        let recorded = vec![
            scored(base, 40),                          // replaces provider at base
            scored(base + Duration::hours(1), 44),     // new sample
            scored(base + Duration::hours(8), 48),     // in the future, ignored
            ScoredHour::empty(base + Duration::hours(2), 2), // no data, ignored
        ];
        let now = base + Duration::hours(7);
        let merged = supplement_with_history(&provider, &recorded, now);

        let temps: Vec<Option<f64>> = merged.iter().map(|s| s.temperature).collect();
        assert_eq!(temps, vec![Some(10.0), Some(11.0), Some(2.0)]);
    }
}
