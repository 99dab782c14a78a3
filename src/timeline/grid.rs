//! The fixed 72-hour grid every timeline is laid out on.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};

pub const TIMELINE_HOURS: usize = 72;

/// One slot of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridHour {
    /// Offset from the grid start, 0..72
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    /// Local hour of day
    pub hour: u32,
    /// Local calendar date
    pub date: NaiveDate,
}

impl GridHour {
    /// End of this slot (exclusive).
    pub fn end(&self) -> DateTime<Utc> {
        self.timestamp + Duration::hours(1)
    }
}

/// Midnight at the start of `date` in `tz`, as UTC.
///
/// On a day where midnight does not exist locally the first hour that does
/// is used; ambiguous midnights take the earlier instant.
pub fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourGrid {
    hours: Vec<GridHour>,
}

impl HourGrid {
    /// 72 consecutive hours starting at `start`, labelled in `tz`.
    pub fn starting_at<Tz: TimeZone>(start: DateTime<Utc>, tz: &Tz) -> Self {
        let hours = (0..TIMELINE_HOURS)
            .map(|index| {
                let timestamp = start + Duration::hours(index as i64);
                let local = timestamp.with_timezone(tz);
                GridHour {
                    index,
                    timestamp,
                    hour: local.hour(),
                    date: local.date_naive(),
                }
            })
            .collect();
        Self { hours }
    }

    /// Grid starting at local midnight of the day before `now`.
    pub fn starting_yesterday<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let yesterday = today.pred_opt().unwrap_or(today);
        Self::starting_at(local_midnight(yesterday, &tz), &tz)
    }

    pub fn hours(&self) -> &[GridHour] {
        &self.hours
    }

    pub fn iter(&self) -> impl Iterator<Item = &GridHour> {
        self.hours.iter()
    }

    pub fn len(&self) -> usize {
        self.hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hours.is_empty()
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.hours[0].timestamp
    }

    /// Exclusive end of the grid.
    pub fn end(&self) -> DateTime<Utc> {
        self.start() + Duration::hours(TIMELINE_HOURS as i64)
    }

    /// Slot containing `ts`, if it falls inside the grid.
    pub fn index_of(&self, ts: DateTime<Utc>) -> Option<usize> {
        if ts < self.start() || ts >= self.end() {
            return None;
        }
        Some(((ts - self.start()).num_seconds() / 3600) as usize)
    }

    /// Round `ts` down onto the grid's hourly phase. Works outside the grid.
    pub fn floor(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let offset = (ts - self.start()).num_seconds().div_euclid(3600);
        self.start() + Duration::hours(offset)
    }
}
