pub mod client;
pub mod types;

pub use client::fetch_schedule_intervals;
pub use types::{
    classify_event, has_outdoor_exposure, is_busy, EventCategory, ScheduleFlags, ScheduleInterval,
};
