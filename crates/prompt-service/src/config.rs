//! Prompt service configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Prompt service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Full URL of the generate-prompt endpoint; unset disables generation
    pub endpoint: Option<String>,
    /// Whole-request timeout (milliseconds)
    pub timeout_ms: u64,
    /// Connect timeout (milliseconds)
    pub connect_timeout_ms: u64,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: 10_000,
            connect_timeout_ms: 5_000,
        }
    }
}

impl PromptConfig {
    /// Point at a local server exposing `/api/generate-prompt`
    pub fn local(base_url: &str) -> Self {
        Self {
            endpoint: Some(format!(
                "{}/api/generate-prompt",
                base_url.trim_end_matches('/')
            )),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
