// Models module for the notes store
// Field names match the persisted JSON and YAML keys

pub mod config;
pub mod format;
pub mod note;

pub use config::{Settings, SettingsUpdate};
pub use format::{FormatRange, FormatTag, TextPos};
pub use note::{DEFAULT_TITLE, IndexEntry, Note, Timestamp, isValidDateFormat, isValidNoteId};
