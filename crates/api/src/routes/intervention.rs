//! Intervention routes

use std::sync::Arc;

use axum::{extract::State, Json};
use intervention::{
    GateState, GroundingStep, InterventionStatus, InterventionView, OpenReason, GROUNDING_STEPS,
};
use serde::Serialize;

use crate::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct InterventionResponse {
    #[serde(flatten)]
    pub status: InterventionStatus,
    /// Exercise steps while the grounding view is showing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grounding: Option<&'static [GroundingStep]>,
}

fn respond(state: &AppState) -> Json<InterventionResponse> {
    let status = state.gate.status();
    let grounding = matches!(
        status.state,
        GateState::Open {
            view: InterventionView::Grounding
        }
    )
    .then_some(&GROUNDING_STEPS[..]);
    Json(InterventionResponse { status, grounding })
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<InterventionResponse> {
    respond(&state)
}

/// Open manually ("panic button" on the journal step)
pub async fn open(State(state): State<Arc<AppState>>) -> Json<InterventionResponse> {
    state.gate.open(OpenReason::Manual);
    respond(&state)
}

pub async fn close(State(state): State<Arc<AppState>>) -> Json<InterventionResponse> {
    state.gate.close();
    respond(&state)
}

pub async fn show_grounding(
    State(state): State<Arc<AppState>>,
) -> Result<Json<InterventionResponse>, ApiError> {
    state.gate.show_grounding()?;
    Ok(respond(&state))
}

pub async fn back_to_breathing(
    State(state): State<Arc<AppState>>,
) -> Result<Json<InterventionResponse>, ApiError> {
    state.gate.back_to_breathing()?;
    Ok(respond(&state))
}
