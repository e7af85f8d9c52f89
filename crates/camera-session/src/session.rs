//! Scoped camera session: acquire, bind, await readiness, release

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::device::{CameraDevice, MediaStream};
use crate::sink::VideoSink;
use crate::{CameraConstraints, CameraError};

/// Bounded readiness polling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessPolicy {
    /// Delay between two readiness checks (milliseconds)
    pub poll_interval_ms: u64,
    /// Checks allowed before giving up
    pub max_polls: u32,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            max_polls: 50,
        }
    }
}

impl ReadinessPolicy {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Cloneable handle that stops a session's stream exactly once.
#[derive(Clone)]
pub struct ReleaseHandle {
    stream: Arc<dyn MediaStream>,
    released: Arc<AtomicBool>,
}

impl ReleaseHandle {
    /// Stop the stream's tracks. Returns `false` if it was already released.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.stream.stop_tracks();
        info!(stream = %self.stream.id(), "Camera stream released");
        true
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    pub fn stream_id(&self) -> Uuid {
        self.stream.id()
    }
}

impl std::fmt::Debug for ReleaseHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseHandle")
            .field("stream", &self.stream.id())
            .field("released", &self.is_released())
            .finish()
    }
}

/// An acquired camera stream. The stream is released when the session is
/// dropped, whatever path got there.
pub struct CameraSession {
    handle: ReleaseHandle,
    sink: Option<VideoSink>,
}

impl CameraSession {
    /// Acquire a stream from `device`
    pub async fn acquire(
        device: &dyn CameraDevice,
        constraints: &CameraConstraints,
    ) -> Result<Self, CameraError> {
        debug!(
            device = device.label(),
            width = constraints.width,
            height = constraints.height,
            "Requesting camera stream"
        );
        let stream = device.open(constraints).await.map_err(|e| {
            warn!(device = device.label(), "Camera acquisition failed: {}", e);
            e
        })?;
        info!(device = device.label(), stream = %stream.id(), "Camera stream acquired");

        Ok(Self {
            handle: ReleaseHandle {
                stream,
                released: Arc::new(AtomicBool::new(false)),
            },
            sink: None,
        })
    }

    /// Attach the stream to a live display surface
    pub fn bind_to_sink(&mut self, sink: VideoSink) -> Result<(), CameraError> {
        if self.handle.is_released() {
            return Err(CameraError::Released);
        }
        self.handle.stream.attach(sink.clone());
        self.sink = Some(sink);
        Ok(())
    }

    /// Wait until the bound sink has decoded a frame.
    ///
    /// Returns how many checks failed before the sink became ready.
    pub async fn await_ready(&self, policy: &ReadinessPolicy) -> Result<u32, CameraError> {
        let sink = self.sink.as_ref().ok_or(CameraError::NotBound)?;

        for polls in 0..policy.max_polls {
            if self.handle.is_released() {
                return Err(CameraError::Released);
            }
            if sink.is_ready() {
                debug!(polls, "Video sink ready");
                return Ok(polls);
            }
            tokio::time::sleep(policy.poll_interval()).await;
        }

        if sink.is_ready() && !self.handle.is_released() {
            return Ok(policy.max_polls);
        }
        warn!(polls = policy.max_polls, "Video sink never became ready");
        Err(CameraError::ReadinessTimeout {
            polls: policy.max_polls,
        })
    }

    /// Stop the stream and detach the sink. Idempotent.
    pub fn release(&mut self) {
        self.handle.release();
        if let Some(sink) = self.sink.take() {
            sink.clear();
        }
    }

    pub fn release_handle(&self) -> ReleaseHandle {
        self.handle.clone()
    }

    pub fn sink(&self) -> Option<&VideoSink> {
        self.sink.as_ref()
    }

    pub fn stream_id(&self) -> Uuid {
        self.handle.stream_id()
    }

    pub fn is_released(&self) -> bool {
        self.handle.is_released()
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.release();
    }
}
