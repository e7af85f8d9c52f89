//! Intervention configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Intervention configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterventionConfig {
    /// Distress events within this long after a close are dropped (0 = off)
    pub reopen_cooldown_ms: u64,
    /// Switch the host theme to safe mode while open
    pub safe_mode_theme: bool,
}

impl Default for InterventionConfig {
    fn default() -> Self {
        Self {
            reopen_cooldown_ms: 0,
            safe_mode_theme: true,
        }
    }
}

impl InterventionConfig {
    /// Give the user a minute after closing before reopening automatically
    pub fn gentle() -> Self {
        Self {
            reopen_cooldown_ms: 60_000,
            ..Default::default()
        }
    }

    pub fn reopen_cooldown(&self) -> Option<Duration> {
        (self.reopen_cooldown_ms > 0).then(|| Duration::from_millis(self.reopen_cooldown_ms))
    }
}
