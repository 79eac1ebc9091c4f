/// Text generation trait and shared error type.
pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("generation API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("prompt blocked: {0}")]
    Blocked(String),

    #[error("model returned no text")]
    EmptyResponse,
}

/// A single-turn text generator.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}
