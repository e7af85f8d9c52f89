//! Replay camera: serves a directory of still images as a live stream

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::device::{CameraDevice, MediaStream};
use crate::frame::VideoFrame;
use crate::sink::VideoSink;
use crate::{CameraConstraints, CameraError};

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Camera device backed by image files, played back in name order and looped.
#[derive(Debug, Clone)]
pub struct ReplayCamera {
    dir: PathBuf,
    label: String,
}

impl ReplayCamera {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let label = format!("replay:{}", dir.display());
        Self { dir, label }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl CameraDevice for ReplayCamera {
    async fn open(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Arc<dyn MediaStream>, CameraError> {
        let dir = self.dir.clone();
        let (width, height) = (constraints.width, constraints.height);
        let frames = tokio::task::spawn_blocking(move || load_frames(&dir, width, height))
            .await
            .map_err(|e| CameraError::DeviceUnavailable(format!("frame loader panicked: {e}")))??;

        info!(device = %self.label, frames = frames.len(), "Replay camera opened");
        Ok(Arc::new(ReplayStream {
            id: Uuid::new_v4(),
            frames: Arc::new(frames),
            interval: constraints.frame_interval(),
            cancel: CancellationToken::new(),
        }))
    }

    fn label(&self) -> &str {
        &self.label
    }
}

fn map_io(dir: &Path, e: io::Error) -> CameraError {
    match e.kind() {
        io::ErrorKind::PermissionDenied => {
            CameraError::PermissionDenied(format!("{}: {}", dir.display(), e))
        }
        _ => CameraError::DeviceUnavailable(format!("{}: {}", dir.display(), e)),
    }
}

fn load_frames(dir: &Path, width: u32, height: u32) -> Result<Vec<VideoFrame>, CameraError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| map_io(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    let mut frames = Vec::with_capacity(paths.len());
    for path in paths {
        match image::open(&path) {
            Ok(img) => {
                let rgb = imageops::resize(&img.to_rgb8(), width, height, FilterType::Triangle);
                frames.push(VideoFrame::from_image(rgb, frames.len() as u64));
            }
            Err(e) => warn!("Skipping undecodable frame {}: {}", path.display(), e),
        }
    }

    if frames.is_empty() {
        return Err(CameraError::DeviceUnavailable(format!(
            "{}: no decodable frames",
            dir.display()
        )));
    }
    Ok(frames)
}

struct ReplayStream {
    id: Uuid,
    frames: Arc<Vec<VideoFrame>>,
    interval: std::time::Duration,
    cancel: CancellationToken,
}

impl MediaStream for ReplayStream {
    fn id(&self) -> Uuid {
        self.id
    }

    fn attach(&self, sink: VideoSink) {
        let frames = self.frames.clone();
        let cancel = self.cancel.clone();
        let period = self.interval;
        let id = self.id;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            let mut sequence = 0u64;
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let idx = (sequence % frames.len() as u64) as usize;
                        let mut frame = frames[idx].clone();
                        frame.sequence = sequence;
                        frame.timestamp_ns = std::time::SystemTime::now()
                            .duration_since(std::time::UNIX_EPOCH)
                            .map(|d| d.as_nanos() as u64)
                            .unwrap_or(0);
                        sink.present(frame);
                        sequence += 1;
                    }
                }
            }
            debug!(stream = %id, frames = sequence, "Replay pump stopped");
        });
    }

    fn stop_tracks(&self) {
        self.cancel.cancel();
    }

    fn is_live(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}
