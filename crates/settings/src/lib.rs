/// Generation settings and studio configuration
///
/// Shared by the history store and the matrix generator: the settings
/// snapshot both operate on, its presets, and the per-user config file.
use std::path::PathBuf;
use thiserror::Error;

pub mod config;
pub mod generation;

pub use config::StudioConfig;
pub use generation::{GenerationSettings, LoraSelection};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("unknown settings field: {0}")]
    UnknownField(String),
    #[error("invalid value '{value}' for {field}: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
    #[error("config io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error at {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub fn app_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| std::env::temp_dir());
    base.join("dreamlayer")
}
