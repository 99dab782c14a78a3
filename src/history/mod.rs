pub mod reconcile;
pub mod stats;
pub mod storage;
pub mod types;

pub use reconcile::{
    latest_good_boundary, merge_hours, project_timeline, reconcile_and_persist,
    supplement_with_history, MergeSummary,
};
pub use stats::{compute_stats, daily_means, trend, DailyScore, HistoryStats, Trend};
pub use storage::{
    get_history_path, HistoryStore, JsonFileStore, MemoryStore, DEFAULT_RETENTION_DAYS,
};
pub use types::{history_key, PersistedHistory, HISTORY_VERSION};
