//! Question answering: language handling around retrieval and one LLM call.
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::PersonaConfig;
use crate::language::{LanguageDetector, language_name};
use crate::llm::{Generator, LlmError};
use crate::prompt::build_prompt;
use crate::rag::{RetrievalError, Retriever, join_context};
use crate::translate::translate_text;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("query is empty")]
    EmptyQuery,

    #[error("translation failed: {0}")]
    Translation(#[source] LlmError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error("generation failed: {0}")]
    Generation(#[source] LlmError),
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatAnswer {
    pub response: String,
    /// French name of the detected language.
    pub language: String,
    /// Documents the context was drawn from, most relevant first.
    pub sources: Vec<String>,
}

#[derive(Clone)]
pub struct ChatService {
    retriever: Retriever,
    generator: Arc<dyn Generator>,
    detector: Arc<dyn LanguageDetector>,
    persona: PersonaConfig,
    top_k: usize,
}

impl ChatService {
    pub fn new(
        retriever: Retriever,
        generator: Arc<dyn Generator>,
        detector: Arc<dyn LanguageDetector>,
        persona: PersonaConfig,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            generator,
            detector,
            persona,
            top_k,
        }
    }

    pub async fn answer(&self, query: &str) -> Result<ChatAnswer, ChatError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ChatError::EmptyQuery);
        }

        let code = self.detector.detect(query);
        let language = language_name(code.as_deref());
        debug!("Detected language: {:?} ({language})", code);

        // Content files are written in the pivot language; retrieve with a
        // translated query when the visitor wrote in another one.
        let search_query = if language == self.persona.pivot_language {
            query.to_string()
        } else {
            translate_text(
                self.generator.as_ref(),
                query,
                &self.persona.pivot_language,
                &self.persona.owner_name,
            )
            .await
            .map_err(ChatError::Translation)?
        };

        let hits = self.retriever.search_hits(&search_query, self.top_k).await?;
        let context = join_context(&hits);

        let mut sources: Vec<String> = Vec::new();
        for hit in &hits {
            if !sources.contains(&hit.doc_id) {
                sources.push(hit.doc_id.clone());
            }
        }
        info!("Answering in {language} with context from {sources:?}");

        let prompt = build_prompt(&self.persona, &context, query);
        let response = self
            .generator
            .generate(&prompt)
            .await
            .map_err(ChatError::Generation)?;

        Ok(ChatAnswer {
            response,
            language: language.to_string(),
            sources,
        })
    }
}
