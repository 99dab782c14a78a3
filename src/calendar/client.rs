use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::calendar::types::ScheduleInterval;
use crate::http::{get_json, ProviderError};
use crate::timeline::grid::local_midnight;

const EVENTS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars/primary/events";

#[derive(Debug, Deserialize)]
pub struct EventList {
    #[serde(default)]
    pub items: Vec<Event>,
}

#[derive(Debug, Deserialize)]
pub struct Event {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
}

/// Either a timed instant or an all-day date.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub date_time: Option<DateTime<chrono::FixedOffset>>,
    pub date: Option<NaiveDate>,
}

impl EventTime {
    fn resolve<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Utc>> {
        if let Some(dt) = self.date_time {
            return Some(dt.with_timezone(&Utc));
        }
        self.date.map(|d| local_midnight(d, tz))
    }
}

/// Turn listed events into classified intervals. Events without a usable
/// start and end are skipped.
pub fn parse_events<Tz: TimeZone>(list: EventList, tz: &Tz) -> Vec<ScheduleInterval> {
    list.items
        .into_iter()
        .filter_map(|event| {
            let start = event.start.as_ref()?.resolve(tz)?;
            let end = event.end.as_ref()?.resolve(tz)?;
            let summary = event.summary.unwrap_or_default();
            let description = event.description.unwrap_or_default();
            Some(ScheduleInterval::new(start, end, &summary, &description))
        })
        .collect()
}

/// Events on the primary calendar between `start` and `end`.
pub async fn fetch_schedule_intervals<Tz: TimeZone>(
    client: &Client,
    token: &str,
    tz: &Tz,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<ScheduleInterval>, ProviderError> {
    let url = format!(
        "{}?timeMin={}&timeMax={}&singleEvents=true&orderBy=startTime&maxResults=250",
        EVENTS_URL,
        start.to_rfc3339_opts(SecondsFormat::Secs, true),
        end.to_rfc3339_opts(SecondsFormat::Secs, true),
    );
    let list: EventList = get_json(client, "Google Calendar", &url, Some(token)).await?;
    let intervals = parse_events(list, tz);
    log::debug!("Google Calendar returned {} events", intervals.len());
    Ok(intervals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::EventCategory;
    use chrono::FixedOffset;

    const BODY: &str = r#"{
        "kind": "calendar#events",
        "items": [
            {
                "summary": "Weekly meeting",
                "start": {"dateTime": "2026-04-02T10:00:00+09:00"},
                "end": {"dateTime": "2026-04-02T11:00:00+09:00"}
            },
            {
                "summary": "出張",
                "description": "Osaka",
                "start": {"date": "2026-04-03"},
                "end": {"date": "2026-04-04"}
            },
            {
                "summary": "Broken",
                "start": {"dateTime": "2026-04-02T12:00:00+09:00"}
            }
        ]
    }"#;

    #[test]
    fn test_parse_events() {
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let list: EventList = serde_json::from_str(BODY).unwrap();
        let intervals = parse_events(list, &jst);
        assert_eq!(intervals.len(), 2);

        assert_eq!(intervals[0].category, EventCategory::Meeting);
        assert_eq!(
            intervals[0].start,
            Utc.with_ymd_and_hms(2026, 4, 2, 1, 0, 0).unwrap()
        );

        // All-day event starts at local midnight
        assert_eq!(intervals[1].category, EventCategory::Outdoor);
        assert_eq!(
            intervals[1].start,
            Utc.with_ymd_and_hms(2026, 4, 2, 15, 0, 0).unwrap()
        );
        assert_eq!(
            intervals[1].end,
            Utc.with_ymd_and_hms(2026, 4, 3, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_missing_items() {
        let list: EventList = serde_json::from_str(r#"{"kind":"calendar#events"}"#).unwrap();
        assert!(parse_events(list, &Utc).is_empty());
    }
}
