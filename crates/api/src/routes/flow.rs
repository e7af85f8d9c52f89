//! Reflection flow routes

use std::sync::Arc;

use axum::{extract::State, Json};
use reflection::{AnswerValue, Behavior, FlowSnapshot, FlowStep, QuestionId};
use serde::Deserialize;
use tracing::debug;

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct BehaviorRequest {
    pub behavior: Behavior,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question: QuestionId,
    pub value: AnswerValue,
}

#[derive(Debug, Deserialize)]
pub struct JournalRequest {
    pub text: String,
}

type FlowResult = Result<Json<FlowSnapshot>, ApiError>;

pub async fn get_flow(State(state): State<Arc<AppState>>) -> Json<FlowSnapshot> {
    Json(state.flow.read().await.snapshot())
}

pub async fn start(State(state): State<Arc<AppState>>) -> FlowResult {
    let mut flow = state.flow.write().await;
    flow.start()?;
    Ok(Json(flow.snapshot()))
}

pub async fn select_behavior(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BehaviorRequest>,
) -> FlowResult {
    let mut flow = state.flow.write().await;
    flow.select_behavior(request.behavior)?;
    Ok(Json(flow.snapshot()))
}

pub async fn answer(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnswerRequest>,
) -> FlowResult {
    let mut flow = state.flow.write().await;
    flow.answer(request.question, request.value)?;
    Ok(Json(flow.snapshot()))
}

/// Advance. Reaching the insight step asks the prompt service for a
/// generated journal prompt; the static one stays on any failure.
pub async fn next(State(state): State<Arc<AppState>>) -> FlowResult {
    let behavior = {
        let mut flow = state.flow.write().await;
        let step = flow.next()?;
        match (step, flow.behavior()) {
            (FlowStep::Insight, Some(behavior)) => behavior,
            _ => return Ok(Json(flow.snapshot())),
        }
    };

    let theme = state.theme.get();
    let generated = state.prompts.request_prompt(behavior, theme).await;

    let mut flow = state.flow.write().await;
    match generated {
        Some(prompt) if flow.step() == FlowStep::Insight && flow.behavior() == Some(behavior) => {
            flow.set_journal_prompt(prompt)?;
        }
        Some(_) => debug!("Flow moved on before the generated prompt arrived"),
        None => debug!("Using static journal prompt"),
    }
    Ok(Json(flow.snapshot()))
}

pub async fn back(State(state): State<Arc<AppState>>) -> FlowResult {
    let mut flow = state.flow.write().await;
    flow.back()?;
    Ok(Json(flow.snapshot()))
}

pub async fn journal(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JournalRequest>,
) -> FlowResult {
    let mut flow = state.flow.write().await;
    flow.write_journal(request.text)?;
    Ok(Json(flow.snapshot()))
}

pub async fn start_over(State(state): State<Arc<AppState>>) -> Json<FlowSnapshot> {
    let mut flow = state.flow.write().await;
    flow.start_over();
    Json(flow.snapshot())
}
