//! Monitor lifecycle and distress edge state

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Controller lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    #[default]
    Disabled,
    /// Loading models and acquiring the camera
    Enabling,
    /// Polling detections
    Active,
    /// Tearing down; transient
    Disabling,
}

impl MonitorState {
    /// The user-facing toggle reads "on"
    pub fn is_enabled(&self) -> bool {
        matches!(self, MonitorState::Enabling | MonitorState::Active)
    }
}

/// Edge detector state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatchState {
    #[default]
    Calm,
    Alerting,
}

/// Turns a stream of distressed/calm samples into rising-edge events.
#[derive(Debug, Clone, Default)]
pub struct DistressLatch {
    state: LatchState,
}

impl DistressLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one sample; true only on a calm → distressed transition
    pub fn observe(&mut self, distressed: bool) -> bool {
        let rising = distressed && self.state == LatchState::Calm;
        self.state = if distressed {
            LatchState::Alerting
        } else {
            LatchState::Calm
        };
        rising
    }

    pub fn state(&self) -> LatchState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = LatchState::Calm;
    }
}

/// Snapshot published on every transition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub state: MonitorState,
    /// Current (or last) session
    pub session_id: Option<Uuid>,
    /// Why the last enable attempt reverted to disabled
    pub last_error: Option<String>,
    /// Detections completed in the current session
    pub ticks: u64,
    /// Ticks skipped (no frame or failed detection) in the current session
    pub skipped_ticks: u64,
    /// Distress events raised in the current session
    pub distress_events: u64,
    pub latch: LatchState,
}

impl MonitorStatus {
    pub fn enabled(&self) -> bool {
        self.state.is_enabled()
    }
}
