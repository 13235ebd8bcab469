// Allow non-snake_case names for JSON serialization compatibility with the stored files
#![allow(non_snake_case)]

pub mod commands;
pub mod error;
pub mod filter;
pub mod formatting;
pub mod models;
pub mod storage;

use std::sync::Arc;

pub use commands::note::{AppState, NotesApp};
pub use error::{NotesError, NotesResult, ValidationError};
pub use filter::{RecencyFilter, filterByRecency};
pub use formatting::{EditingSurface, TextBuffer, ToggleOutcome};
pub use models::{FormatRange, FormatTag, IndexEntry, Note, Settings, TextPos, Timestamp};
pub use storage::{ConsistencyReport, NoteIndex, Storage};

/// Installs the fmt subscriber; RUST_LOG overrides `level`. Safe to call more than once.
pub fn initLogging(level: &str) -> bool {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init().is_ok()
}

/// Startup wiring: global config, logging, then the notes store
pub fn init() -> NotesResult<AppState> {
    let configPath = storage::globalConfigPath()?;
    let settings = commands::settings::getSettings(&configPath);
    initLogging(&settings.logLevel);

    let app = NotesApp::fromSettings(&settings)?;
    if let Some(err) = app.indexLoadError() {
        tracing::warn!("[init] notes index could not be read: {}", err);
    }
    Ok(Arc::new(app))
}
