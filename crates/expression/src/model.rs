//! Model seams and inference outputs

use std::sync::Arc;

use async_trait::async_trait;
use camera_session::VideoFrame;
use serde::{Deserialize, Serialize};

use crate::ExpressionError;

/// Artifact name of the face detector
pub const FACE_DETECTOR_MODEL: &str = "tiny_face_detector";
/// Artifact name of the expression classifier
pub const EXPRESSION_MODEL: &str = "face_expression";

/// Per-expression probabilities (0-1)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExpressionScores {
    pub neutral: f32,
    pub happy: f32,
    pub sad: f32,
    pub angry: f32,
    pub fearful: f32,
    pub disgusted: f32,
    pub surprised: f32,
}

impl ExpressionScores {
    /// Output order of the expression net
    pub const LABELS: [&'static str; 7] = [
        "neutral",
        "happy",
        "sad",
        "angry",
        "fearful",
        "disgusted",
        "surprised",
    ];

    /// Build from a model output row in [`Self::LABELS`] order
    pub fn from_slice(values: &[f32]) -> Option<Self> {
        match *values {
            [neutral, happy, sad, angry, fearful, disgusted, surprised] => Some(Self {
                neutral,
                happy,
                sad,
                angry,
                fearful,
                disgusted,
                surprised,
            }),
            _ => None,
        }
    }

    pub fn as_array(&self) -> [f32; 7] {
        [
            self.neutral,
            self.happy,
            self.sad,
            self.angry,
            self.fearful,
            self.disgusted,
            self.surprised,
        ]
    }

    /// Label and score of the strongest expression
    pub fn dominant(&self) -> (&'static str, f32) {
        Self::LABELS
            .iter()
            .zip(self.as_array())
            .fold(("neutral", f32::MIN), |best, (label, score)| {
                if score > best.1 {
                    (*label, score)
                } else {
                    best
                }
            })
    }
}

/// Face bounding box in frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub score: f32,
}

/// Best face in a frame with its expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceExpressions {
    pub face: FaceBox,
    pub scores: ExpressionScores,
}

/// Loaded face + expression models.
#[async_trait]
pub trait ExpressionModel: Send + Sync {
    /// Find the single most confident face and classify its expression.
    /// `Ok(None)` when no face clears the detector threshold.
    async fn detect_single_face(
        &self,
        frame: &VideoFrame,
    ) -> Result<Option<FaceExpressions>, ExpressionError>;
}

/// Where model artifacts come from.
#[async_trait]
pub trait ModelSource: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn ExpressionModel>, ExpressionError>;

    /// Short description for logs
    fn describe(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_requires_seven_scores() {
        assert!(ExpressionScores::from_slice(&[0.1; 6]).is_none());
        let scores =
            ExpressionScores::from_slice(&[0.1, 0.0, 0.6, 0.0, 0.3, 0.0, 0.0]).unwrap();
        assert_eq!(scores.sad, 0.6);
        assert_eq!(scores.fearful, 0.3);
    }

    #[test]
    fn test_dominant_expression() {
        let scores = ExpressionScores {
            happy: 0.7,
            sad: 0.2,
            ..Default::default()
        };
        assert_eq!(scores.dominant(), ("happy", 0.7));
    }
}
