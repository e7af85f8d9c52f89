//! Static catalog routes

use axum::Json;
use reflection::{all_questions, Behavior, Question};
use serde::Serialize;

/// Selectable behavior pattern
#[derive(Debug, Serialize)]
pub struct BehaviorOption {
    pub id: Behavior,
    pub label: &'static str,
}

/// Patterns offered on the selection step
pub async fn behaviors() -> Json<Vec<BehaviorOption>> {
    Json(
        Behavior::SELECTABLE
            .into_iter()
            .map(|id| BehaviorOption {
                id,
                label: id.label(),
            })
            .collect(),
    )
}

/// Slider questions in order, then the free-text ones
pub async fn questions() -> Json<Vec<Question>> {
    Json(all_questions())
}
