//! Application settings
//!
//! Layered as defaults, then an optional TOML file (`CELESTIAL_CONFIG`,
//! default `celestial-archive.toml`), then `CELESTIAL_*` environment
//! variables with `__` between nested keys, e.g.
//! `CELESTIAL_MONITOR__POLL_INTERVAL_MS=500`.

use std::path::PathBuf;

use config::{Config, Environment, File};
use expression::DetectionConfig;
use intervention::InterventionConfig;
use monitor::MonitorConfig;
use prompt_service::PromptConfig;
use serde::{Deserialize, Serialize};

use crate::ApiError;

pub const CONFIG_PATH_VAR: &str = "CELESTIAL_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "celestial-archive.toml";
const ENV_PREFIX: &str = "CELESTIAL";

/// HTTP listener
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Log output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `trace`, `debug`, `info`, `warn` or `error`
    pub level: String,
    /// Emit JSON lines instead of plain text
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Camera backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Directory of still frames replayed as the camera feed
    pub replay_dir: PathBuf,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            replay_dir: PathBuf::from("frames"),
        }
    }
}

/// Everything the binary needs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub server: ServerSettings,
    pub logging: LogSettings,
    pub camera: CameraSettings,
    pub detection: DetectionConfig,
    pub monitor: MonitorConfig,
    pub intervention: InterventionConfig,
    pub prompt: PromptConfig,
}

impl AppSettings {
    /// Load from `CELESTIAL_CONFIG` (or the default path) plus environment
    pub fn load() -> Result<Self, ApiError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Load from `path` (optional) plus environment
    pub fn load_from(path: &str) -> Result<Self, ApiError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
