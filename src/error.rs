// Error types for the notes core
// Every failure is returned to the caller; nothing here aborts the process

use std::path::Path;
use thiserror::Error;

/// Reasons a note is refused before anything is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("note content cannot be empty")]
    EmptyContent,
}

#[derive(Debug, Error)]
pub enum NotesError {
    #[error("STORAGE_READ: {path}: {reason}")]
    StorageRead { path: String, reason: String },
    #[error("STORAGE_WRITE: {path}: {reason}")]
    StorageWrite { path: String, reason: String },
    #[error("VALIDATION: {0}")]
    Validation(#[from] ValidationError),
    #[error("NO_SELECTION: select text to format")]
    NoSelection,
    #[error("INVALID_ID: {0}")]
    InvalidId(String),
    #[error("CONFIG: {0}")]
    Config(String),
}

impl NotesError {
    pub fn read(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::StorageRead {
            path: path.to_string_lossy().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::StorageWrite {
            path: path.to_string_lossy().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn isStorageRead(&self) -> bool {
        matches!(self, Self::StorageRead { .. })
    }

    pub fn isStorageWrite(&self) -> bool {
        matches!(self, Self::StorageWrite { .. })
    }
}

pub type NotesResult<T> = Result<T, NotesError>;
