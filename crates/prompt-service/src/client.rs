//! HTTP prompt client

use async_trait::async_trait;
use reflection::{Behavior, ThemeVariant};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::PromptConfig;
use crate::PromptError;

const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

/// Response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptResponse {
    pub text: Option<String>,
}

/// Source of generated journaling prompts
#[async_trait]
pub trait PromptService: Send + Sync {
    /// One attempt, no retry. `None` on any failure.
    async fn request_prompt(&self, behavior: Behavior, theme: ThemeVariant) -> Option<String>;
}

/// Instruction sent to the generation endpoint
pub fn system_prompt(behavior: Behavior, theme: ThemeVariant) -> String {
    format!(
        "You are a supportive AI mental health companion in a {theme} themed app. \
         The user has selected the behavior pattern: \"{behavior}\". \
         Provide one deep, insightful journaling prompt to help them process this. \
         Keep it under 30 words and match the {aesthetic} aesthetic.",
        theme = theme,
        behavior = behavior,
        aesthetic = theme.aesthetic(),
    )
}

/// Client for the generate-prompt endpoint
pub struct PromptClient {
    config: PromptConfig,
    http: reqwest::Client,
}

impl PromptClient {
    pub fn new(config: PromptConfig) -> Result<Self, PromptError> {
        let http = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &PromptConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.config.endpoint.is_some()
    }

    /// Fetch a prompt, surfacing why it failed
    pub async fn fetch(&self, behavior: Behavior, theme: ThemeVariant) -> Result<String, PromptError> {
        let endpoint = self
            .config
            .endpoint
            .as_deref()
            .ok_or(PromptError::NotConfigured)?;

        let body = PromptRequest {
            prompt: system_prompt(behavior, theme),
        };
        let response = self.http.post(endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PromptError::Status(status.as_u16()));
        }

        let response: PromptResponse = response.json().await?;
        let text = response
            .text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(PromptError::Empty)?;
        debug!(behavior = %behavior, theme = %theme, "Generated journal prompt received");
        Ok(text)
    }

    /// Generated prompt, or `fallback` when generation fails
    pub async fn prompt_or(&self, behavior: Behavior, theme: ThemeVariant, fallback: &str) -> String {
        self.request_prompt(behavior, theme)
            .await
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[async_trait]
impl PromptService for PromptClient {
    async fn request_prompt(&self, behavior: Behavior, theme: ThemeVariant) -> Option<String> {
        match self.fetch(behavior, theme).await {
            Ok(text) => Some(text),
            Err(PromptError::NotConfigured) => None,
            Err(PromptError::Client(e)) if e.is_decode() => {
                warn!("Decoding prompt response failed: {}", e);
                None
            }
            Err(e) => {
                warn!("Prompt fetch failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Seen = Arc<Mutex<Vec<String>>>;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn echo_server(seen: Seen) -> String {
        async fn generate(
            State(seen): State<Seen>,
            Json(body): Json<PromptRequest>,
        ) -> Json<serde_json::Value> {
            seen.lock().unwrap().push(body.prompt);
            Json(serde_json::json!({ "text": "  What are you protecting by staying quiet?  " }))
        }
        serve(
            Router::new()
                .route("/api/generate-prompt", post(generate))
                .with_state(seen),
        )
        .await
    }

    fn client(base: &str) -> PromptClient {
        PromptClient::new(PromptConfig::local(base)).unwrap()
    }

    #[tokio::test]
    async fn test_returns_generated_text() {
        let seen = Seen::default();
        let base = echo_server(seen.clone()).await;

        let text = client(&base)
            .request_prompt(Behavior::Shutdown, ThemeVariant::Rift)
            .await;
        assert_eq!(text.as_deref(), Some("What are you protecting by staying quiet?"));

        let prompts = seen.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("\"shutdown\""));
        assert!(prompts[0].contains("dark/gritty"));
        assert!(prompts[0].contains("under 30 words"));
    }

    #[tokio::test]
    async fn test_error_status_yields_none() {
        let base = serve(Router::new().route(
            "/api/generate-prompt",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        ))
        .await;

        let client = client(&base);
        assert!(client
            .request_prompt(Behavior::AvoidConflict, ThemeVariant::Horizon)
            .await
            .is_none());
        assert!(matches!(
            client.fetch(Behavior::AvoidConflict, ThemeVariant::Horizon).await,
            Err(PromptError::Status(500))
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_yields_none() {
        let base = serve(Router::new().route(
            "/api/generate-prompt",
            post(|| async { "not json" }),
        ))
        .await;
        assert!(client(&base)
            .request_prompt(Behavior::OverApologize, ThemeVariant::Horizon)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_missing_text_yields_none() {
        let base = serve(Router::new().route(
            "/api/generate-prompt",
            post(|| async { Json(serde_json::json!({ "text": null })) }),
        ))
        .await;
        assert!(matches!(
            client(&base)
                .fetch(Behavior::StruggleToAsk, ThemeVariant::Horizon)
                .await,
            Err(PromptError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let base = serve(Router::new().route(
            "/api/generate-prompt",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(serde_json::json!({ "text": "late" }))
            }),
        ))
        .await;
        let config = PromptConfig {
            timeout_ms: 100,
            ..PromptConfig::local(&base)
        };
        let client = PromptClient::new(config).unwrap();
        assert!(client
            .request_prompt(Behavior::Shutdown, ThemeVariant::Horizon)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_falls_back() {
        let client = PromptClient::new(PromptConfig::default()).unwrap();
        assert!(!client.is_configured());
        let text = client
            .prompt_or(Behavior::Shutdown, ThemeVariant::Neutral, "static prompt")
            .await;
        assert_eq!(text, "static prompt");
    }

    #[test]
    fn test_system_prompt_mentions_theme() {
        let prompt = system_prompt(Behavior::ResponsibleForOthers, ThemeVariant::Horizon);
        assert!(prompt.contains("horizon themed app"));
        assert!(prompt.contains("\"responsible-for-others\""));
        assert!(prompt.contains("ethereal/calm"));
    }
}
