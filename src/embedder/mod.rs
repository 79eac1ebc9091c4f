/// Embedder trait and shared types for text embedding.
pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("embedding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("embedding API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("expected {expected}-dimensional vector, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Trait for text embedding implementations.
///
/// All implementations must be `Send + Sync` to allow concurrent use
/// behind `Arc`.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a search query.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;

    /// Embed documents for storage in the index.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError>;

    /// Return the dimensionality of the embedding vectors.
    fn dimensions(&self) -> usize;

    /// Identifier of the embedding space, recorded alongside stored vectors.
    fn model_name(&self) -> &str;
}
