//! Monitor configuration

use std::time::Duration;

use camera_session::{CameraConstraints, ReadinessPolicy};
use serde::{Deserialize, Serialize};

/// Monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Detection cadence (milliseconds)
    pub poll_interval_ms: u64,
    /// Camera request
    pub constraints: CameraConstraints,
    /// Bounded wait for the first decoded frame
    pub readiness: ReadinessPolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            constraints: CameraConstraints::user_facing(),
            readiness: ReadinessPolicy::default(),
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
