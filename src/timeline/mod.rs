pub mod builder;
pub mod daily;
pub mod grid;
pub mod interpolate;
pub mod types;

pub use builder::{build_hourly_timeline, resolve_samples, trailing_delta};
pub use daily::{build_daily_outlook, DailyOutlook};
pub use grid::{GridHour, HourGrid, TIMELINE_HOURS};
pub use interpolate::{find_neighbors, interpolate_at};
pub use types::{ScoredHour, Timeline};
