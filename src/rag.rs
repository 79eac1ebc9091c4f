//! Retrieval: query embedding + similarity search + context assembly.
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex as TokioMutex;
use tracing::debug;

use crate::db::Db;
use crate::db::models::SearchHit;
use crate::embedder::{Embedder, EmbedderError};

/// Separator placed between retrieved passages in the assembled context.
pub const CONTEXT_SEPARATOR: &str = "\n---\n";

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("query embedding failed: {0}")]
    Embedding(#[from] EmbedderError),

    #[error("vector search failed: {0}")]
    Search(#[from] rusqlite::Error),
}

#[derive(Clone)]
pub struct Retriever {
    db: Arc<TokioMutex<Db>>,
    embedder: Arc<dyn Embedder>,
    collection: String,
}

impl Retriever {
    pub fn new(db: Arc<TokioMutex<Db>>, embedder: Arc<dyn Embedder>, collection: impl Into<String>) -> Self {
        Self {
            db,
            embedder,
            collection: collection.into(),
        }
    }

    /// The `n_results` passages closest to `query`, most relevant first.
    pub async fn search_hits(&self, query: &str, n_results: usize) -> Result<Vec<SearchHit>, RetrievalError> {
        if n_results == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query).await?;
        let hits = {
            let db = self.db.lock().await;
            db.search(&self.collection, &query_vector, n_results)?
        };

        debug!(
            "Retrieved {} passages: {:?}",
            hits.len(),
            hits.iter().map(|h| h.doc_id.as_str()).collect::<Vec<_>>()
        );
        Ok(hits)
    }

    /// Retrieved passages joined into one context string.
    pub async fn search(&self, query: &str, n_results: usize) -> Result<String, RetrievalError> {
        let hits = self.search_hits(query, n_results).await?;
        Ok(join_context(&hits))
    }
}

/// Joins passage texts with [`CONTEXT_SEPARATOR`].
pub fn join_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|h| h.content.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}
