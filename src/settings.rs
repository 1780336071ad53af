// Settings file - typed defaults merged with settings.json
//
// Stored at <config_dir>/assistive/settings.json. Every field has a default,
// so a partial file only overrides what it names.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::popup::PopupGeometry;
use crate::replay::{ReplayTimings, DEFAULT_MAX_CONCURRENT_REPLAYS};
use crate::shortcuts::Scope;
use crate::trigger::buffer::DEFAULT_BUFFER_CAPACITY;

/// Directory name under the platform config/data dirs
pub const APP_DIR: &str = "assistive";

/// Settings file name inside the config directory
pub const SETTINGS_FILE: &str = "settings.json";

/// Error types for settings I/O
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse settings from {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Holds the database file and logs
    pub data_dir: PathBuf,
    /// Whose templates and macros the hook serves
    pub scope: Scope,
    pub replay: ReplayTimings,
    /// Replays allowed to run at once; 1 serializes them
    pub max_concurrent_replays: usize,
    /// Characters remembered for trigger detection
    pub buffer_capacity: usize,
    pub popup: PopupGeometry,
    /// Upper bound on a store round trip made from the hook thread
    pub store_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            scope: Scope::default(),
            replay: ReplayTimings::default(),
            max_concurrent_replays: DEFAULT_MAX_CONCURRENT_REPLAYS,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            popup: PopupGeometry::default(),
            store_timeout_ms: 500,
        }
    }
}

/// `<data_dir>/assistive`, or `./assistive` when the platform has none
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// `<config_dir>/assistive/settings.json`
pub fn settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(SETTINGS_FILE)
}

impl Settings {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            crate::debug!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings = serde_json::from_str(&contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        crate::debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| write_err(std::io::Error::other(e)))?;
        std::fs::write(path, json).map_err(write_err)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(crate::turso::DATABASE_FILE)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
