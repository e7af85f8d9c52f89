//! API error type

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use intervention::InterventionError;
use reflection::ReflectionError;
use serde_json::json;
use thiserror::Error;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Reflection(#[from] ReflectionError),

    #[error(transparent)]
    Intervention(#[from] InterventionError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid log level: {0}")]
    LogLevel(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Metrics setup failed: {0}")]
    Metrics(String),

    #[error("Prompt client setup failed: {0}")]
    Prompt(#[from] prompt_service::PromptError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Reflection(e) => match e {
                ReflectionError::InvalidTransition { .. }
                | ReflectionError::Unanswered(_)
                | ReflectionError::ThemeLocked => StatusCode::CONFLICT,
                ReflectionError::UnknownBehavior(_)
                | ReflectionError::NotSelectable(_)
                | ReflectionError::UnknownQuestion(_)
                | ReflectionError::OutOfRange { .. }
                | ReflectionError::WrongKind { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            },
            ApiError::Intervention(InterventionError::NotOpen) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
