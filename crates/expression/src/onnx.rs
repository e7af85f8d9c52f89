//! ONNX backend using tract.
//!
//! Expected artifact layout inside the model directory:
//! - `tiny_face_detector.onnx`: input `[1, 3, S, S]` RGB scaled to 0..1,
//!   output `[1, N, 5]` rows of `x1, y1, x2, y2, score` normalised to 0..1
//! - `face_expression.onnx`: input `[1, 3, E, E]` RGB scaled to 0..1,
//!   output `[1, 7]` in [`ExpressionScores::LABELS`] order (probabilities or
//!   logits)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use camera_session::VideoFrame;
use tract_onnx::prelude::*;
use tracing::{debug, info};

use crate::config::DetectionConfig;
use crate::model::{
    ExpressionModel, ExpressionScores, FaceBox, FaceExpressions, ModelSource, EXPRESSION_MODEL,
    FACE_DETECTOR_MODEL,
};
use crate::ExpressionError;

type Plan = TypedRunnableModel<TypedModel>;

/// Loads both artifacts from a directory
#[derive(Debug, Clone)]
pub struct OnnxModelSource {
    dir: PathBuf,
    face_input_size: u32,
    face_score_threshold: f32,
    expression_input_size: u32,
}

impl OnnxModelSource {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            dir: config.model_dir.clone(),
            face_input_size: config.face_input_size,
            face_score_threshold: config.face_score_threshold,
            expression_input_size: config.expression_input_size,
        }
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.onnx"))
    }
}

fn load_plan(path: &Path, size: u32) -> Result<Plan, ExpressionError> {
    info!("Loading model from {}", path.display());
    let size = size as usize;
    tract_onnx::onnx()
        .model_for_path(path)
        .and_then(|m| m.with_input_fact(0, f32::fact([1, 3, size, size]).into()))
        .and_then(|m| m.into_optimized())
        .and_then(|m| m.into_runnable())
        .map_err(|e| ExpressionError::ModelLoad(format!("{}: {}", path.display(), e)))
}

#[async_trait]
impl ModelSource for OnnxModelSource {
    async fn load(&self) -> Result<Arc<dyn ExpressionModel>, ExpressionError> {
        let face_path = self.artifact_path(FACE_DETECTOR_MODEL);
        let expression_path = self.artifact_path(EXPRESSION_MODEL);
        let (face_size, expression_size) = (self.face_input_size, self.expression_input_size);

        let (face, expression) = tokio::task::spawn_blocking(move || {
            let face = load_plan(&face_path, face_size)?;
            let expression = load_plan(&expression_path, expression_size)?;
            Ok::<_, ExpressionError>((face, expression))
        })
        .await
        .map_err(|e| ExpressionError::ModelLoad(format!("loader task failed: {e}")))??;

        Ok(Arc::new(OnnxExpressionModel {
            plans: Arc::new(Plans { face, expression }),
            face_input_size: self.face_input_size,
            face_score_threshold: self.face_score_threshold,
            expression_input_size: self.expression_input_size,
        }))
    }

    fn describe(&self) -> String {
        format!("onnx:{}", self.dir.display())
    }
}

struct Plans {
    face: Plan,
    expression: Plan,
}

/// Face detector + expression net pair
pub struct OnnxExpressionModel {
    plans: Arc<Plans>,
    face_input_size: u32,
    face_score_threshold: f32,
    expression_input_size: u32,
}

#[async_trait]
impl ExpressionModel for OnnxExpressionModel {
    async fn detect_single_face(
        &self,
        frame: &VideoFrame,
    ) -> Result<Option<FaceExpressions>, ExpressionError> {
        let frame = frame.clone();
        let plans = self.plans.clone();
        let (face_size, threshold, expression_size) = (
            self.face_input_size,
            self.face_score_threshold,
            self.expression_input_size,
        );

        tokio::task::spawn_blocking(move || {
            run_pipeline(&plans, &frame, face_size, threshold, expression_size)
        })
        .await
        .map_err(|e| ExpressionError::Inference(format!("inference task failed: {e}")))?
    }
}

fn run_pipeline(
    plans: &Plans,
    frame: &VideoFrame,
    face_size: u32,
    threshold: f32,
    expression_size: u32,
) -> Result<Option<FaceExpressions>, ExpressionError> {
    let input = to_tensor(frame, face_size)?;
    let outputs = plans
        .face
        .run(tvec!(input.into()))
        .map_err(|e| ExpressionError::Inference(e.to_string()))?;
    let raw: Vec<f32> = outputs[0]
        .to_array_view::<f32>()
        .map_err(|e| ExpressionError::Inference(e.to_string()))?
        .iter()
        .copied()
        .collect();

    let Some(face) = best_face(&raw, frame.width, frame.height, threshold) else {
        return Ok(None);
    };
    debug!(score = face.score, "Face detected");

    let crop = frame
        .crop(
            face.x as u32,
            face.y as u32,
            (face.width as u32).max(1),
            (face.height as u32).max(1),
        )
        .ok_or_else(|| ExpressionError::ImageProcessing("face box outside the frame".into()))?;
    let input = to_tensor(&crop, expression_size)?;
    let outputs = plans
        .expression
        .run(tvec!(input.into()))
        .map_err(|e| ExpressionError::Inference(e.to_string()))?;
    let raw: Vec<f32> = outputs[0]
        .to_array_view::<f32>()
        .map_err(|e| ExpressionError::Inference(e.to_string()))?
        .iter()
        .copied()
        .collect();

    let scores = ExpressionScores::from_slice(&normalise(&raw)).ok_or_else(|| {
        ExpressionError::Inference(format!("expected 7 expression scores, got {}", raw.len()))
    })?;
    Ok(Some(FaceExpressions { face, scores }))
}

/// Resize to `size`x`size` and lay out as NCHW, scaled to 0..1
fn to_tensor(frame: &VideoFrame, size: u32) -> Result<Tensor, ExpressionError> {
    let resized = frame.resize(size, size).ok_or_else(|| {
        ExpressionError::ImageProcessing("Failed to create image buffer".into())
    })?;
    let size = size as usize;
    let array = tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, c, y, x)| {
        resized
            .get_pixel(x as u32, y as u32)
            .map_or(0.0, |pixel| pixel[c] as f32 / 255.0)
    });
    Ok(array.into())
}

/// Highest scoring detector row above `threshold`, mapped to frame pixels
fn best_face(raw: &[f32], width: u32, height: u32, threshold: f32) -> Option<FaceBox> {
    let (w, h) = (width as f32, height as f32);
    raw.chunks_exact(5)
        .filter(|row| row[4] >= threshold)
        .max_by(|a, b| a[4].total_cmp(&b[4]))
        .and_then(|row| {
            let x1 = row[0].clamp(0.0, 1.0) * w;
            let y1 = row[1].clamp(0.0, 1.0) * h;
            let x2 = row[2].clamp(0.0, 1.0) * w;
            let y2 = row[3].clamp(0.0, 1.0) * h;
            if x2 - x1 < 1.0 || y2 - y1 < 1.0 {
                return None;
            }
            Some(FaceBox {
                x: x1,
                y: y1,
                width: x2 - x1,
                height: y2 - y1,
                score: row[4],
            })
        })
}

/// Softmax unless the row already looks like a probability distribution
fn normalise(raw: &[f32]) -> Vec<f32> {
    let sum: f32 = raw.iter().sum();
    if raw.iter().all(|v| (0.0..=1.0).contains(v)) && (sum - 1.0).abs() < 0.01 {
        return raw.to_vec();
    }
    let max = raw.iter().copied().fold(f32::MIN, f32::max);
    let exps: Vec<f32> = raw.iter().map(|v| (v - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.iter().map(|v| v / total).collect()
}
