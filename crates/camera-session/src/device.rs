//! Camera device seam

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{sink::VideoSink, CameraConstraints, CameraError};

/// A source of camera streams (platform camera, replay directory, fake).
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Request a stream. Resolves once the user/platform has granted access
    /// and the device is delivering, or with the reason it cannot.
    async fn open(&self, constraints: &CameraConstraints)
        -> Result<Arc<dyn MediaStream>, CameraError>;

    /// Human-readable device label for logs
    fn label(&self) -> &str {
        "camera"
    }
}

/// A live stream handed out by a [`CameraDevice`].
pub trait MediaStream: Send + Sync {
    /// Unique stream identifier
    fn id(&self) -> Uuid;

    /// Start decoding into `sink`
    fn attach(&self, sink: VideoSink);

    /// Stop every underlying device track. Must be safe to call repeatedly.
    fn stop_tracks(&self);

    /// True until the tracks are stopped
    fn is_live(&self) -> bool;
}
