//! Facial Expression Analysis
//!
//! Single-frame emotional state detection for the distress monitor:
//! - Process-wide, memoized loading of the face and expression models
//! - ONNX backend (tiny face detector + seven-class expression net)
//! - Sad/fear threshold classification of each detection tick

pub mod config;
pub mod detector;
pub mod loader;
pub mod model;
pub mod onnx;

pub use config::DetectionConfig;
pub use detector::{DetectionTick, DistressDetector};
pub use loader::{ModelLoader, ModelState};
pub use model::{ExpressionModel, ExpressionScores, FaceBox, FaceExpressions, ModelSource};
pub use onnx::OnnxModelSource;

use thiserror::Error;

/// Expression analysis error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Models not loaded")]
    ModelNotLoaded,

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),
}
