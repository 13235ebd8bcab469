// Recency filtering and ordering over index entries
// Pure functions, no I/O

use chrono::{NaiveDateTime, TimeDelta};

use crate::models::{IndexEntry, Settings, Timestamp};

/// Preset views offered by the notes list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecencyFilter {
    LastDays(u32),
    All,
}

impl RecencyFilter {
    pub fn lastWeek() -> Self {
        Self::LastDays(7)
    }

    pub fn lastMonth() -> Self {
        Self::LastDays(30)
    }

    pub fn recentFrom(settings: &Settings) -> Self {
        Self::LastDays(settings.recentDays)
    }

    pub fn monthFrom(settings: &Settings) -> Self {
        Self::LastDays(settings.monthDays)
    }

    pub fn days(&self) -> Option<u32> {
        match self {
            Self::LastDays(days) => Some(*days),
            Self::All => None,
        }
    }
}

impl From<Option<u32>> for RecencyFilter {
    fn from(days: Option<u32>) -> Self {
        days.map(Self::LastDays).unwrap_or(Self::All)
    }
}

/// Entries created at or after now - days (all entries when days is None),
/// most recent first
pub fn filterByRecency(entries: &[IndexEntry], days: Option<u32>, now: Timestamp) -> Vec<IndexEntry> {
    let mut result: Vec<IndexEntry> = match days {
        None => entries.to_vec(),
        Some(days) => {
            let cutoff = cutoffFor(now, days);
            entries.iter().filter(|e| e.created.naive() >= cutoff).cloned().collect()
        }
    };
    result.sort_by(|a, b| b.created.cmp(&a.created));
    result
}

fn cutoffFor(now: Timestamp, days: u32) -> NaiveDateTime {
    TimeDelta::try_days(i64::from(days))
        .and_then(|delta| now.checkedSub(delta))
        .map(|ts| ts.naive())
        .unwrap_or(NaiveDateTime::MIN)
}
