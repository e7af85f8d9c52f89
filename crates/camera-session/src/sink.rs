//! Live display surface a stream decodes into

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::frame::VideoFrame;

#[derive(Debug, Default)]
struct SinkState {
    frame: Option<VideoFrame>,
    decoded: u64,
}

/// Latest-frame holder shared between a stream and its consumers.
///
/// Cloning yields another handle to the same surface.
#[derive(Debug, Clone, Default)]
pub struct VideoSink {
    state: Arc<Mutex<SinkState>>,
}

impl VideoSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Present a newly decoded frame. Empty frames are ignored.
    pub fn present(&self, frame: VideoFrame) {
        if frame.is_empty() {
            return;
        }
        let mut state = self.lock();
        state.frame = Some(frame);
        state.decoded += 1;
    }

    /// Number of frames decoded since the last [`VideoSink::clear`]
    pub fn frames_decoded(&self) -> u64 {
        self.lock().decoded
    }

    /// At least one real frame has been decoded
    pub fn is_ready(&self) -> bool {
        self.frames_decoded() > 0
    }

    /// Snapshot of the most recent frame
    pub fn latest_frame(&self) -> Option<VideoFrame> {
        self.lock().frame.clone()
    }

    /// Detach: drop the held frame and reset readiness
    pub fn clear(&self) {
        *self.lock() = SinkState::default();
    }
}
