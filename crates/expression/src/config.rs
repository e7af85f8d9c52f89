//! Detection configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Sad score above which a tick counts as distressed
    pub sad_threshold: f32,

    /// Fear score above which a tick counts as distressed
    pub fear_threshold: f32,

    /// Square input size fed to the face detector
    pub face_input_size: u32,

    /// Minimum face detector score
    pub face_score_threshold: f32,

    /// Square input size fed to the expression net
    pub expression_input_size: u32,

    /// Directory holding the model artifacts
    pub model_dir: PathBuf,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            sad_threshold: 0.30,
            fear_threshold: 0.30,
            face_input_size: 160,
            face_score_threshold: 0.4,
            expression_input_size: 112,
            model_dir: PathBuf::from("models"),
        }
    }
}

impl DetectionConfig {
    /// Create sensitive config (lower thresholds)
    pub fn sensitive() -> Self {
        Self {
            sad_threshold: 0.20,
            fear_threshold: 0.20,
            ..Default::default()
        }
    }

    /// Create conservative config (higher thresholds)
    pub fn conservative() -> Self {
        Self {
            sad_threshold: 0.50,
            fear_threshold: 0.50,
            ..Default::default()
        }
    }
}
