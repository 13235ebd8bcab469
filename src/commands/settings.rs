// Settings commands

use std::path::Path;

use crate::error::{NotesError, NotesResult};
use crate::models::{Settings, SettingsUpdate, isValidDateFormat};
use crate::storage::{loadSettings, saveSettings};

pub fn getSettings(configPath: &Path) -> Settings {
    let settings = loadSettings(configPath);
    tracing::debug!("[getSettings] baseDir: {:?}, logLevel: {}", settings.baseDir, settings.logLevel);
    settings
}

/// Applies the fields that are set and writes the result back
pub fn updateSettings(configPath: &Path, input: SettingsUpdate) -> NotesResult<Settings> {
    tracing::debug!("[updateSettings] Updates: {:?}", input);

    if let Some(level) = &input.logLevel {
        if tracing_subscriber::EnvFilter::try_new(level).is_err() {
            return Err(NotesError::Config(format!("invalid log level '{}'", level)));
        }
    }
    if let Some(format) = &input.dateFormat {
        if !isValidDateFormat(format) {
            return Err(NotesError::Config(format!("invalid date format '{}'", format)));
        }
    }

    let settings = loadSettings(configPath).withUpdate(&input);
    saveSettings(configPath, &settings)?;

    tracing::info!("[updateSettings] SUCCESS");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_persists_merged_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.md");

        let updated = updateSettings(
            &path,
            SettingsUpdate {
                recentDays: Some(14),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.recentDays, 14);
        assert_eq!(getSettings(&path), updated);

        let again = updateSettings(
            &path,
            SettingsUpdate {
                logLevel: Some("debug".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(again.recentDays, 14);
        assert_eq!(again.logLevel, "debug");
    }

    #[test]
    fn test_update_rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.md");
        let err = updateSettings(
            &path,
            SettingsUpdate {
                dateFormat: Some("  ".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, NotesError::Config(_)));
        assert!(!path.exists());

        let err = updateSettings(
            &path,
            SettingsUpdate {
                dateFormat: Some("%Q".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, NotesError::Config(_)));
        assert!(!path.exists());
    }
}
