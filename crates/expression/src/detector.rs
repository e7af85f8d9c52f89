//! Distress detection over single frames

use std::sync::Arc;

use camera_session::VideoFrame;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DetectionConfig;
use crate::loader::ModelLoader;
use crate::ExpressionError;

/// One inference result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionTick {
    pub timestamp: DateTime<Utc>,
    /// Sad probability (0-1)
    pub sad_score: f32,
    /// Fear probability (0-1)
    pub fear_score: f32,
    pub face_found: bool,
}

impl DetectionTick {
    pub fn face(sad_score: f32, fear_score: f32) -> Self {
        Self {
            timestamp: Utc::now(),
            sad_score: sad_score.clamp(0.0, 1.0),
            fear_score: fear_score.clamp(0.0, 1.0),
            face_found: true,
        }
    }

    pub fn no_face() -> Self {
        Self {
            timestamp: Utc::now(),
            sad_score: 0.0,
            fear_score: 0.0,
            face_found: false,
        }
    }

    /// Distressed iff a face was found and sad or fear is strictly above
    /// its threshold. A missing face is never distress.
    pub fn is_distressed(&self, config: &DetectionConfig) -> bool {
        self.face_found
            && (self.sad_score > config.sad_threshold || self.fear_score > config.fear_threshold)
    }
}

/// Runs one inference per call against the shared models
pub struct DistressDetector {
    loader: Arc<ModelLoader>,
    config: DetectionConfig,
}

impl DistressDetector {
    pub fn new(loader: Arc<ModelLoader>, config: DetectionConfig) -> Self {
        Self { loader, config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn loader(&self) -> &Arc<ModelLoader> {
        &self.loader
    }

    /// Make sure the models are loaded
    pub async fn load_models(&self) -> Result<(), ExpressionError> {
        self.loader.ensure_loaded().await.map(|_| ())
    }

    /// Analyze a single frame. Never loads models itself.
    pub async fn detect(&self, frame: &VideoFrame) -> Result<DetectionTick, ExpressionError> {
        let models = self.loader.models().ok_or(ExpressionError::ModelNotLoaded)?;
        if frame.is_empty() {
            return Err(ExpressionError::ImageProcessing("empty frame".into()));
        }

        match models.detect_single_face(frame).await? {
            Some(detection) => {
                let tick = DetectionTick::face(detection.scores.sad, detection.scores.fearful);
                debug!(
                    "Emotion data -> sad: {:.2}, fear: {:.2}",
                    tick.sad_score, tick.fear_score
                );
                Ok(tick)
            }
            None => {
                debug!("Face not found in frame");
                Ok(DetectionTick::no_face())
            }
        }
    }

    pub fn is_distressed(&self, tick: &DetectionTick) -> bool {
        tick.is_distressed(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExpressionModel, ExpressionScores, FaceBox, FaceExpressions, ModelSource};
    use async_trait::async_trait;
    use proptest::prelude::*;

    struct FixedModel(Option<ExpressionScores>);

    #[async_trait]
    impl ExpressionModel for FixedModel {
        async fn detect_single_face(
            &self,
            _frame: &VideoFrame,
        ) -> Result<Option<FaceExpressions>, ExpressionError> {
            Ok(self.0.map(|scores| FaceExpressions {
                face: FaceBox {
                    x: 0.0,
                    y: 0.0,
                    width: 10.0,
                    height: 10.0,
                    score: 0.9,
                },
                scores,
            }))
        }
    }

    struct FixedSource(Option<ExpressionScores>);

    #[async_trait]
    impl ModelSource for FixedSource {
        async fn load(&self) -> Result<Arc<dyn ExpressionModel>, ExpressionError> {
            Ok(Arc::new(FixedModel(self.0)))
        }

        fn describe(&self) -> String {
            "fixed".into()
        }
    }

    fn detector(scores: Option<ExpressionScores>) -> DistressDetector {
        let loader = Arc::new(ModelLoader::new(Arc::new(FixedSource(scores))));
        DistressDetector::new(loader, DetectionConfig::default())
    }

    #[test]
    fn test_threshold_is_strict() {
        let config = DetectionConfig::default();
        assert!(DetectionTick::face(0.31, 0.0).is_distressed(&config));
        assert!(DetectionTick::face(0.0, 0.31).is_distressed(&config));
        assert!(!DetectionTick::face(0.30, 0.30).is_distressed(&config));
    }

    #[test]
    fn test_no_face_is_calm() {
        let config = DetectionConfig::default();
        let tick = DetectionTick {
            sad_score: 0.9,
            fear_score: 0.9,
            ..DetectionTick::no_face()
        };
        assert!(!tick.is_distressed(&config));
    }

    #[tokio::test]
    async fn test_detect_requires_loaded_models() {
        let detector = detector(None);
        let frame = VideoFrame::filled(8, 8, [0, 0, 0]);
        assert_eq!(
            detector.detect(&frame).await,
            Err(ExpressionError::ModelNotLoaded)
        );
    }

    #[tokio::test]
    async fn test_detect_maps_scores() {
        let detector = detector(Some(ExpressionScores {
            sad: 0.5,
            fearful: 0.1,
            ..Default::default()
        }));
        detector.load_models().await.unwrap();

        let tick = detector.detect(&VideoFrame::filled(8, 8, [0, 0, 0])).await.unwrap();
        assert!(tick.face_found);
        assert_eq!(tick.sad_score, 0.5);
        assert!(detector.is_distressed(&tick));
    }

    #[tokio::test]
    async fn test_detect_reports_missing_face() {
        let detector = detector(None);
        detector.load_models().await.unwrap();

        let tick = detector.detect(&VideoFrame::filled(8, 8, [0, 0, 0])).await.unwrap();
        assert!(!tick.face_found);
        assert!(!detector.is_distressed(&tick));
    }

    #[tokio::test]
    async fn test_empty_frame_is_a_tick_failure() {
        let detector = detector(None);
        detector.load_models().await.unwrap();
        let frame = VideoFrame::new(Vec::new(), 0, 0, 0);
        assert!(matches!(
            detector.detect(&frame).await,
            Err(ExpressionError::ImageProcessing(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_distress_matches_rule(sad in 0.0f32..=1.0, fear in 0.0f32..=1.0, face in any::<bool>()) {
            let config = DetectionConfig::default();
            let tick = DetectionTick { face_found: face, ..DetectionTick::face(sad, fear) };
            let expected = face && (sad > 0.30 || fear > 0.30);
            prop_assert_eq!(tick.is_distressed(&config), expected);
        }
    }
}
