/// Studio configuration loaded from the per-user data directory
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{app_data_dir, SettingsError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Undo entries kept per history
    pub history_capacity: usize,

    /// Window in which rapid edits coalesce into one undo entry
    pub debounce_ms: u64,

    /// Upper bound on jobs a single matrix may expand to
    pub max_matrix_jobs: usize,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            history_capacity: 25,
            debounce_ms: 150,
            max_matrix_jobs: 10_000,
        }
    }
}

impl StudioConfig {
    pub fn default_path() -> PathBuf {
        app_data_dir().join("config.json")
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&raw).map_err(|source| SettingsError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(?path, "loaded studio config");
        Ok(config)
    }

    /// Defaults when the file does not exist; parse errors still surface
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!(?path, "no studio config, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let data = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, data).map_err(io_err)
    }
}
