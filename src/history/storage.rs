//! Persistence for scored hours.
//!
//! A store assumes it is the only writer. Two processes writing the same
//! history file at once is unsupported: each run reads, merges and rewrites
//! the whole file, so the last commit wins and the other run's hours are lost.

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, Duration, Utc};
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::reconcile::{merge_hours, MergeSummary};
use super::types::{PersistedHistory, HISTORY_VERSION};
use crate::timeline::ScoredHour;

/// Default retention window
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Key-value store of scored hours.
///
/// Implementors provide whole-history load/save; reads, merges and pruning
/// are shared.
pub trait HistoryStore {
    fn load(&self) -> Result<PersistedHistory>;

    fn save(&mut self, history: &PersistedHistory) -> Result<()>;

    /// Entries older than this are pruned on every write
    fn retention(&self) -> Duration;

    /// Recorded hours with `start <= timestamp < end`, in time order.
    fn read(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<ScoredHour>> {
        Ok(self.load()?.range(start, end))
    }

    /// Merge `hours` under the protect-the-past rule, prune, and save.
    fn write(
        &mut self,
        hours: &[ScoredHour],
        boundary: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<MergeSummary> {
        let mut history = self.load()?;
        let mut summary = merge_hours(&mut history, hours, boundary);
        summary.pruned = history.prune_before(now - self.retention());
        self.save(&history)?;
        Ok(summary)
    }
}

/// Get the default history file path (~/.config/condition-forecast/history.json)
pub fn get_history_path() -> Result<PathBuf> {
    Ok(crate::config::get_config_dir()?.join("history.json"))
}

/// History kept in a pretty-printed JSON file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    retention: Duration,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, retention: Duration) -> Self {
        Self {
            path: path.into(),
            retention,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for JsonFileStore {
    /// A missing file is empty history. So is a file that does not parse or
    /// carries an unknown version; that case logs a warning and the next
    /// save replaces it.
    fn load(&self) -> Result<PersistedHistory> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(PersistedHistory::default()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to open history file at {}", self.path.display())
                })
            }
        };

        let history: PersistedHistory = match serde_json::from_reader(file) {
            Ok(history) => history,
            Err(e) => {
                log::warn!(
                    "History file {} is unreadable ({}); starting with empty history",
                    self.path.display(),
                    e
                );
                return Ok(PersistedHistory::default());
            }
        };

        // Version check
        if history.version != HISTORY_VERSION {
            log::warn!(
                "Unsupported history version {} in {}; starting with empty history",
                history.version,
                self.path.display()
            );
            return Ok(PersistedHistory::default());
        }

        Ok(history)
    }

    fn save(&mut self, history: &PersistedHistory) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create history directory at {}", parent.display())
                })?;
            }
        }

        // Open atomic write file
        let mut file = AtomicWriteFile::open(&self.path).with_context(|| {
            format!("Failed to open atomic write file at {}", self.path.display())
        })?;

        // Write JSON with pretty formatting
        serde_json::to_writer_pretty(&mut file, history).context("Failed to serialize history")?;

        // Commit the write atomically
        file.commit().context("Failed to save history")?;

        Ok(())
    }

    fn retention(&self) -> Duration {
        self.retention
    }
}

/// In-process store, used by tests and the demo command.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    history: PersistedHistory,
    retention: Duration,
    saves: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Duration::days(DEFAULT_RETENTION_DAYS))
    }
}

impl MemoryStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            history: PersistedHistory::default(),
            retention,
            saves: 0,
        }
    }

    pub fn with_history(history: PersistedHistory, retention: Duration) -> Self {
        Self {
            history,
            retention,
            saves: 0,
        }
    }

    pub fn history(&self) -> &PersistedHistory {
        &self.history
    }

    /// Number of saves so far
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl HistoryStore for MemoryStore {
    fn load(&self) -> Result<PersistedHistory> {
        Ok(self.history.clone())
    }

    fn save(&mut self, history: &PersistedHistory) -> Result<()> {
        self.history = history.clone();
        self.saves += 1;
        Ok(())
    }

    fn retention(&self) -> Duration {
        self.retention
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::RawSample;
    use chrono::TimeZone;
    use std::env;

    fn scored(ts: DateTime<Utc>, score: u32) -> ScoredHour {
        ScoredHour {
            total_score: Some(score),
            raw_sample: Some(RawSample {
                temperature: Some(9.0),
                ..RawSample::empty(ts)
            }),
            ..ScoredHour::empty(ts, 0)
        }
    }

    #[test]
    fn test_load_missing_file_returns_empty() {
        let temp_path = env::temp_dir().join("condition_forecast_test_missing.json");
        // Ensure it doesn't exist
        let _ = std::fs::remove_file(&temp_path);

        let store = JsonFileStore::new(&temp_path, Duration::days(30));
        let history = store.load().unwrap();
        assert_eq!(history.version, HISTORY_VERSION);
        assert!(history.is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_path = env::temp_dir().join("condition_forecast_test_roundtrip.json");
        let _ = std::fs::remove_file(&temp_path);

        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut store = JsonFileStore::new(&temp_path, Duration::days(30));
        let hours = vec![scored(now, 77), ScoredHour::empty(now + Duration::hours(1), 13)];
        store.write(&hours, now, now).unwrap();

        let loaded = store.read(now, now + Duration::hours(2)).unwrap();
        assert_eq!(loaded, hours);

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let temp_path = env::temp_dir().join("condition_forecast_test_corrupt.json");
        std::fs::write(&temp_path, "{ not json").unwrap();

        let mut store = JsonFileStore::new(&temp_path, Duration::days(30));
        assert!(store.load().unwrap().is_empty());

        // The next write replaces the corrupt file
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        store.write(&[scored(now, 50)], now, now).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn test_unknown_version_loads_empty() {
        let temp_path = env::temp_dir().join("condition_forecast_test_version.json");
        std::fs::write(&temp_path, r#"{"version": 7, "entries": {}}"#).unwrap();

        let store = JsonFileStore::new(&temp_path, Duration::days(30));
        assert!(store.load().unwrap().is_empty());

        let _ = std::fs::remove_file(&temp_path);
    }

    #[test]
    fn test_write_prunes_old_entries() {
        let now = Utc.with_ymd_and_hms(2026, 3, 31, 0, 0, 0).unwrap();
        let old = now - Duration::days(31);
        let recent = now - Duration::days(29);
        let mut store = MemoryStore::default();
        store.write(&[scored(old, 60), scored(recent, 70)], now, old).unwrap();
        assert_eq!(store.history().len(), 2);

        let summary = store.write(&[], now, now).unwrap();
        assert_eq!(summary.pruned, 1);
        assert!(store.history().get(old).is_none());
        assert!(store.history().get(recent).is_some());
    }
}
