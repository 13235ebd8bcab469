// Note model for the flat-file JSON store
// Timestamp-derived id is also the file name (<id>.json)

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Write};

use super::format::FormatRange;

/// Title used when the user leaves the title blank
pub const DEFAULT_TITLE: &str = "Untitled Note";

const ISO_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";
const ISO_MICROS: &str = "%Y-%m-%dT%H:%M:%S%.6f";
const ISO_ANY_FRACTION: &str = "%Y-%m-%dT%H:%M:%S%.f";
const ID_FORMAT: &str = "%Y%m%d_%H%M%S";

// ============================================
// TIMESTAMP
// ============================================

/// Local wall-clock time with microsecond precision, stored as ISO-8601 without offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    pub fn now() -> Self {
        Self::fromNaive(Local::now().naive_local())
    }

    pub fn fromNaive(value: NaiveDateTime) -> Self {
        let micros = value.nanosecond() / 1_000 * 1_000;
        Self(value.with_nanosecond(micros).unwrap_or(value))
    }

    pub fn naive(&self) -> NaiveDateTime {
        self.0
    }

    /// Fraction is omitted when it is zero, otherwise six digits
    pub fn toIsoString(&self) -> String {
        if self.0.nanosecond() == 0 {
            self.0.format(ISO_SECONDS).to_string()
        } else {
            self.0.format(ISO_MICROS).to_string()
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if let Ok(value) = NaiveDateTime::parse_from_str(raw, ISO_ANY_FRACTION) {
            return Ok(Self::fromNaive(value));
        }
        DateTime::parse_from_rfc3339(raw)
            .map(|value| Self::fromNaive(value.with_timezone(&Local).naive_local()))
            .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
    }

    /// Human-readable form for list cards; an unusable format falls back to ISO-8601
    pub fn display(&self, format: &str) -> String {
        if !isValidDateFormat(format) {
            tracing::warn!("[Timestamp::display] invalid date format '{}', using ISO-8601", format);
            return self.toIsoString();
        }
        let mut out = String::new();
        match write!(out, "{}", self.0.format(format)) {
            Ok(()) => out,
            Err(_) => self.toIsoString(),
        }
    }

    /// Note id derived from this instant (second granularity)
    pub fn noteId(&self) -> String {
        self.0.format(ID_FORMAT).to_string()
    }

    pub fn checkedAdd(&self, delta: TimeDelta) -> Option<Self> {
        self.0.checked_add_signed(delta).map(Self)
    }

    pub fn checkedSub(&self, delta: TimeDelta) -> Option<Self> {
        self.0.checked_sub_signed(delta).map(Self)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.toIsoString())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.toIsoString())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// True when every strftime specifier in `format` is one chrono understands
pub fn isValidDateFormat(format: &str) -> bool {
    !format.trim().is_empty() && StrftimeItems::new(format).all(|item| !matches!(item, Item::Error))
}

// ============================================
// IDS
// ============================================

/// Ids double as file names, so only a safe character set is accepted
pub fn isValidNoteId(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

// ============================================
// RECORDS
// ============================================

/// Full persisted record for one note (field order matches <id>.json)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub formatting: Vec<FormatRange>,
    pub created: Timestamp,
    pub modified: Timestamp,
}

impl Note {
    /// Record that has never been saved: created == modified
    pub fn new(id: String, title: String, content: String, formatting: Vec<FormatRange>, at: Timestamp) -> Self {
        Self {
            id,
            title,
            content,
            formatting,
            created: at,
            modified: at,
        }
    }

    pub fn indexEntry(&self) -> IndexEntry {
        IndexEntry::from(self)
    }
}

/// Summary row kept in notes_index.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub title: String,
    pub created: Timestamp,
    pub modified: Timestamp,
}

impl From<&Note> for IndexEntry {
    fn from(n: &Note) -> Self {
        Self {
            id: n.id.clone(),
            title: n.title.clone(),
            created: n.created,
            modified: n.modified,
        }
    }
}
