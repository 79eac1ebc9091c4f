/// Mock embedder for testing purposes.
///
/// Generates deterministic embeddings based on text hash.
use std::hash::{DefaultHasher, Hash, Hasher};

use async_trait::async_trait;

use super::{Embedder, EmbedderError};

/// A mock embedder that produces deterministic vectors from text hashes.
///
/// Useful for testing without a Gemini API key.
pub struct MockEmbedder {
    pub dimensions: usize,
}

impl MockEmbedder {
    /// Create a new `MockEmbedder` with the given dimensionality.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let hash = hasher.finish();

        // Spread the hash over the vector; i / 8 varies the sign pattern
        // so short vectors from different inputs are not collinear.
        let bytes = hash.to_le_bytes();
        let mut embedding: Vec<f32> = (0..self.dimensions)
            .map(|i| {
                let v = bytes[i % 8] as f32 / 255.0;
                if (bytes[(i / 8) % 8] >> (i % 8)) & 1 == 1 { v } else { -v }
            })
            .collect();

        // L2 normalize
        let norm_sq: f32 = embedding.iter().map(|v| v * v).sum();
        if norm_sq > 0.0 {
            let inv = 1.0 / norm_sq.sqrt();
            for v in &mut embedding {
                *v *= inv;
            }
        }

        embedding
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self { dimensions: 768 }
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        Ok(self.vector_for(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
