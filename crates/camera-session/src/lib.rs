//! Camera Session Library
//!
//! Scoped access to a user-facing camera for the distress monitor:
//! - Device acquisition behind the [`CameraDevice`] seam
//! - Live [`VideoSink`] that holds the most recently decoded frame
//! - Readiness polling (first decoded frame, bounded)
//! - Guaranteed release of the stream on every exit path
//! - Replay camera backed by a directory of still images

pub mod device;
pub mod frame;
pub mod replay;
pub mod session;
pub mod sink;

pub use device::{CameraDevice, MediaStream};
pub use frame::VideoFrame;
pub use replay::ReplayCamera;
pub use session::{CameraSession, ReadinessPolicy, ReleaseHandle};
pub use sink::VideoSink;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("Camera device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Video sink never decoded a frame after {polls} polls")]
    ReadinessTimeout { polls: u32 },

    #[error("Stream not bound to a video sink")]
    NotBound,

    #[error("Stream already released")]
    Released,
}

/// Which way the camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera, pointed at the user
    #[default]
    User,
    /// Rear camera
    Environment,
}

/// Constraints requested when acquiring a stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConstraints {
    /// Requested frame width
    pub width: u32,
    /// Requested frame height
    pub height: u32,
    /// Camera direction
    pub facing_mode: FacingMode,
    /// Target frame rate delivered to the sink
    pub fps: u32,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self::user_facing()
    }
}

impl CameraConstraints {
    /// Small user-facing capture used by the emotional monitor
    pub fn user_facing() -> Self {
        Self {
            width: 300,
            height: 300,
            facing_mode: FacingMode::User,
            fps: 15,
        }
    }

    /// Interval between frames pushed into a sink
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }
}
