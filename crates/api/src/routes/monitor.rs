//! Emotional monitor routes

use std::sync::Arc;

use axum::{extract::State, Json};
use monitor::MonitorStatus;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    /// Whether the request changed anything
    pub changed: bool,
    pub status: MonitorStatus,
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<MonitorStatus> {
    Json(state.monitor.status())
}

/// Start monitoring. Acquisition continues in the background; a failure
/// shows up later as `state: disabled` with `last_error` set.
pub async fn enable(State(state): State<Arc<AppState>>) -> Json<ToggleResponse> {
    let changed = state.monitor.enable();
    Json(ToggleResponse {
        changed,
        status: state.monitor.status(),
    })
}

pub async fn disable(State(state): State<Arc<AppState>>) -> Json<ToggleResponse> {
    let changed = state.monitor.disable();
    Json(ToggleResponse {
        changed,
        status: state.monitor.status(),
    })
}
