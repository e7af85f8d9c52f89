//! Theme routes

use std::sync::Arc;

use axum::{extract::State, Json};
use reflection::ThemeVariant;
use serde::{Deserialize, Serialize};

use crate::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    pub theme: ThemeVariant,
    pub aesthetic: &'static str,
    /// Safe mode is on; the user cannot switch themes
    pub locked: bool,
}

#[derive(Debug, Deserialize)]
pub struct ThemeRequest {
    pub theme: ThemeVariant,
}

fn current(state: &AppState) -> ThemeResponse {
    let theme = state.theme.get();
    ThemeResponse {
        theme,
        aesthetic: theme.aesthetic(),
        locked: theme == ThemeVariant::Neutral,
    }
}

pub async fn get_theme(State(state): State<Arc<AppState>>) -> Json<ThemeResponse> {
    Json(current(&state))
}

pub async fn set_theme(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ThemeRequest>,
) -> Result<Json<ThemeResponse>, ApiError> {
    state.theme.select(request.theme)?;
    Ok(Json(current(&state)))
}
