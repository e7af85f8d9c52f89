//! Emotional Monitor
//!
//! Owns the enable/disable lifecycle of webcam distress detection:
//! model load and camera acquisition, readiness wait, a once-per-second
//! detection poll, and edge-triggered distress notification. Disabling or
//! dropping the controller cancels the poll and releases the camera.

mod config;
mod controller;
mod observer;
mod state;

pub use config::MonitorConfig;
pub use controller::MonitorController;
pub use observer::DistressObserver;
pub use state::{DistressLatch, LatchState, MonitorState, MonitorStatus};

use camera_session::CameraError;
use expression::ExpressionError;
use thiserror::Error;

/// Reasons an enable attempt falls back to disabled
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MonitorError {
    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Model(#[from] ExpressionError),
}
