use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::Mutex as TokioMutex;
use tracing::{info, warn};

use crate::chat::ChatService;
use crate::config::Config;
use crate::db::Db;
use crate::embedder::Embedder;
use crate::embedder::gemini::GeminiEmbedder;
use crate::indexer::core::{IndexReport, Indexer};
use crate::language::{LanguageDetector, WhatlangDetector};
use crate::llm::Generator;
use crate::llm::gemini::GeminiGenerator;
use crate::rag::Retriever;

/// Shared application state.
///
/// `embedder` and `generator` are `None` when no Gemini API key is
/// configured; the server still starts and reports itself unavailable.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<TokioMutex<Db>>,
    pub embedder: Option<Arc<dyn Embedder>>,
    pub generator: Option<Arc<dyn Generator>>,
    pub detector: Arc<dyn LanguageDetector>,
}

impl AppState {
    /// Build the state from configuration, wiring the Gemini clients if a key is present.
    pub fn from_config(config: Config) -> Result<Self> {
        let db = Db::open(&config.db_path, config.gemini.dimensions)
            .with_context(|| format!("failed to open vector store {}", config.db_path.display()))?;

        let (embedder, generator): (Option<Arc<dyn Embedder>>, Option<Arc<dyn Generator>>) =
            match config.gemini.api_key.as_deref().filter(|_| config.gemini.is_configured()) {
                Some(key) => {
                    let client = reqwest::Client::builder()
                        .connect_timeout(Duration::from_secs(10))
                        .timeout(Duration::from_secs(config.gemini.timeout_secs))
                        .build()
                        .context("failed to build HTTP client")?;
                    info!(
                        "Gemini configured (embedding: {}, generation: {})",
                        config.gemini.embedding_model, config.gemini.generation_model
                    );
                    (
                        Some(Arc::new(GeminiEmbedder::new(client.clone(), &config.gemini, key)) as Arc<dyn Embedder>),
                        Some(Arc::new(GeminiGenerator::new(client, &config.gemini, key)) as Arc<dyn Generator>),
                    )
                }
                None => {
                    warn!("GEMINI_API_KEY is not set; indexing and chat are disabled");
                    (None, None)
                }
            };

        Ok(Self::new(
            config,
            db,
            embedder,
            generator,
            Arc::new(WhatlangDetector),
        ))
    }

    pub fn new(
        config: Config,
        db: Db,
        embedder: Option<Arc<dyn Embedder>>,
        generator: Option<Arc<dyn Generator>>,
        detector: Arc<dyn LanguageDetector>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            db: Arc::new(TokioMutex::new(db)),
            embedder,
            generator,
            detector,
        }
    }

    /// The chat pipeline, if both Gemini clients are available.
    pub fn chat_service(&self) -> Option<ChatService> {
        let embedder = self.embedder.clone()?;
        let generator = self.generator.clone()?;
        let retriever = Retriever::new(self.db.clone(), embedder, self.config.collection.clone());
        Some(ChatService::new(
            retriever,
            generator,
            self.detector.clone(),
            self.config.persona.clone(),
            self.config.search_top_k,
        ))
    }

    /// Run one indexing pass over the content directory.
    ///
    /// Returns `None` when no embedder is configured.
    pub async fn reindex(&self, force: bool) -> Option<Result<IndexReport>> {
        let embedder = self.embedder.as_ref()?;
        let indexer = Indexer::new(
            self.db.clone(),
            embedder.as_ref(),
            &self.config.collection,
            self.config.chunk_size,
        );
        Some(indexer.index_directory(&self.config.content_dir, force).await)
    }
}
