use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Meeting,
    Outdoor,
    Sleep,
    Meal,
    Other,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventCategory::Meeting => "meeting",
            EventCategory::Outdoor => "outdoor",
            EventCategory::Sleep => "sleep",
            EventCategory::Meal => "meal",
            EventCategory::Other => "other",
        };
        f.write_str(s)
    }
}

// Checked in this order; the first hit wins.
const KEYWORDS: [(EventCategory, &[&str]); 4] = [
    (EventCategory::Meeting, &["meeting", "会", "打ち合わせ"]),
    (EventCategory::Outdoor, &["outdoor", "外出", "出張"]),
    (EventCategory::Sleep, &["sleep", "寝", "睡眠"]),
    (EventCategory::Meal, &["meal", "食"]),
];

/// Classify an event by keywords in its summary and description.
pub fn classify_event(summary: &str, description: &str) -> EventCategory {
    let text = format!("{} {}", summary, description).to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| text.contains(w)))
        .map(|(category, _)| *category)
        .unwrap_or(EventCategory::Other)
}

/// A classified calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub category: EventCategory,
    pub summary: String,
}

impl ScheduleInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, summary: &str, description: &str) -> Self {
        Self {
            start,
            end,
            category: classify_event(summary, description),
            summary: summary.to_string(),
        }
    }

    /// Whether this interval intersects the half-open window [start, end).
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && start < self.end.max(self.start + chrono::Duration::seconds(1))
    }
}

/// Schedule load summarised for a whole day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleFlags {
    pub has_meetings: bool,
    pub has_outdoor_activities: bool,
    pub sleep_interruption: bool,
    pub meal_interruption: bool,
}

impl ScheduleFlags {
    pub fn from_intervals<'a>(intervals: impl IntoIterator<Item = &'a ScheduleInterval>) -> Self {
        let mut flags = Self::default();
        for interval in intervals {
            match interval.category {
                EventCategory::Meeting => flags.has_meetings = true,
                EventCategory::Outdoor => flags.has_outdoor_activities = true,
                EventCategory::Sleep => flags.sleep_interruption = true,
                EventCategory::Meal => flags.meal_interruption = true,
                EventCategory::Other => {}
            }
        }
        flags
    }

    /// Flags from the intervals that touch [start, end).
    pub fn for_window(intervals: &[ScheduleInterval], start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::from_intervals(intervals.iter().filter(|i| i.overlaps(start, end)))
    }

    pub fn is_clear(&self) -> bool {
        *self == Self::default()
    }
}

/// Anything booked during [start, end).
pub fn is_busy(intervals: &[ScheduleInterval], start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    intervals.iter().any(|i| i.overlaps(start, end))
}

/// An outdoor event during [start, end).
pub fn has_outdoor_exposure(
    intervals: &[ScheduleInterval],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> bool {
    intervals
        .iter()
        .any(|i| i.category == EventCategory::Outdoor && i.overlaps(start, end))
}
