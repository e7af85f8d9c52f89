//! Prompt Service
//!
//! Asks a text-generation endpoint for a journaling prompt tailored to the
//! selected behavior and theme. Any failure yields `None` so callers fall
//! back to the static insight prompt.

mod client;
mod config;

pub use client::{system_prompt, PromptClient, PromptRequest, PromptResponse, PromptService};
pub use config::PromptConfig;

use thiserror::Error;

/// Prompt fetch error types
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Prompt endpoint not configured")]
    NotConfigured,

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Prompt endpoint returned status {0}")]
    Status(u16),

    #[error("Prompt endpoint returned no text")]
    Empty,
}
