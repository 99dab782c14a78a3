use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::timeline::ScoredHour;

pub const HISTORY_VERSION: u32 = 1;

/// Key for an hour in the store: RFC 3339, whole seconds, `Z` suffix.
/// Keys in this form sort chronologically.
pub fn history_key(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Every scored hour the tool has recorded, keyed by [`history_key`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedHistory {
    pub version: u32,
    pub entries: BTreeMap<String, ScoredHour>,
}

impl Default for PersistedHistory {
    fn default() -> Self {
        Self {
            version: HISTORY_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

impl PersistedHistory {
    pub fn get(&self, timestamp: DateTime<Utc>) -> Option<&ScoredHour> {
        self.entries.get(&history_key(timestamp))
    }

    pub fn insert(&mut self, hour: ScoredHour) {
        self.entries.insert(history_key(hour.timestamp), hour);
    }

    /// Entries with `start <= timestamp < end`, in time order.
    pub fn range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<ScoredHour> {
        self.entries
            .range(history_key(start)..history_key(end))
            .map(|(_, hour)| hour.clone())
            .collect()
    }

    /// Drop entries older than `cutoff`. Returns how many were removed.
    pub fn prune_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, hour| hour.timestamp >= cutoff);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
