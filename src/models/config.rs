// Configuration model
// Stored as YAML frontmatter in ~/.notekeeper/config.md

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All settings, every field optional on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory that holds notes/ (defaults to the global config directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseDir: Option<String>,
    pub logLevel: String,
    pub recentDays: u32,
    pub monthDays: u32,
    pub dateFormat: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            baseDir: None,
            logLevel: "info".to_string(),
            recentDays: 7,
            monthDays: 30,
            dateFormat: "%b %d, %Y at %I:%M %p".to_string(),
        }
    }
}

impl Settings {
    /// Configured base directory, or the fallback when unset or blank
    pub fn resolveBaseDir(&self, fallback: PathBuf) -> PathBuf {
        match &self.baseDir {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir.trim()),
            _ => fallback,
        }
    }
}

/// Partial settings for updates (all fields optional)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseDir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logLevel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recentDays: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthDays: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dateFormat: Option<String>,
}

impl Settings {
    /// Merge with a partial update
    pub fn withUpdate(&self, update: &SettingsUpdate) -> Self {
        Self {
            baseDir: update.baseDir.clone().or_else(|| self.baseDir.clone()),
            logLevel: update.logLevel.clone().unwrap_or_else(|| self.logLevel.clone()),
            recentDays: update.recentDays.unwrap_or(self.recentDays),
            monthDays: update.monthDays.unwrap_or(self.monthDays),
            dateFormat: update.dateFormat.clone().unwrap_or_else(|| self.dateFormat.clone()),
        }
    }
}
