/// Gemini embedding client.
///
/// Calls `models/{model}:embedContent` for queries and
/// `models/{model}:batchEmbedContents` for documents.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Embedder, EmbedderError};
use crate::config::GeminiConfig;

/// The batch endpoint accepts at most 100 requests per call.
const MAX_BATCH: usize = 100;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TaskType {
    RetrievalQuery,
    RetrievalDocument,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: TaskType,
    output_dimensionality: usize,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Values,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<Values>,
}

#[derive(Deserialize)]
struct Values {
    values: Vec<f32>,
}

/// Embedder backed by the Gemini REST API.
pub struct GeminiEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    /// `models/<model>`, as the request body expects it.
    model_path: String,
    dimensions: usize,
}

impl GeminiEmbedder {
    pub fn new(client: reqwest::Client, config: &GeminiConfig, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: config.embedding_model.clone(),
            model_path: format!("models/{}", config.embedding_model),
            dimensions: config.dimensions,
        }
    }

    fn request<'a>(&'a self, text: &'a str, task_type: TaskType) -> EmbedRequest<'a> {
        EmbedRequest {
            model: &self.model_path,
            content: Content {
                parts: vec![Part { text }],
            },
            task_type,
            output_dimensionality: self.dimensions,
        }
    }

    async fn post<B: Serialize + ?Sized, R: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<R, EmbedderError> {
        let url = format!("{}/{}:{method}", self.base_url, self.model_path);
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EmbedderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.json().await?)
    }

    fn check_dimensions(&self, values: &[f32]) -> Result<(), EmbedderError> {
        if values.len() != self.dimensions {
            return Err(EmbedderError::DimensionMismatch {
                expected: self.dimensions,
                actual: values.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let req = self.request(text, TaskType::RetrievalQuery);
        let resp: EmbedResponse = self.post("embedContent", &req).await?;
        self.check_dimensions(&resp.embedding.values)?;
        Ok(resp.embedding.values)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let mut all = Vec::with_capacity(texts.len());

        for batch in texts.chunks(MAX_BATCH) {
            let req = BatchEmbedRequest {
                requests: batch
                    .iter()
                    .map(|&t| self.request(t, TaskType::RetrievalDocument))
                    .collect(),
            };
            debug!("Embedding batch of {} texts with {}", batch.len(), self.model);

            let resp: BatchEmbedResponse = self.post("batchEmbedContents", &req).await?;
            if resp.embeddings.len() != batch.len() {
                return Err(EmbedderError::CountMismatch {
                    expected: batch.len(),
                    actual: resp.embeddings.len(),
                });
            }
            for e in resp.embeddings {
                self.check_dimensions(&e.values)?;
                all.push(e.values);
            }
        }

        Ok(all)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder() -> GeminiEmbedder {
        let config = GeminiConfig {
            base_url: "http://localhost:1/v1beta/".to_string(),
            dimensions: 4,
            ..GeminiConfig::default()
        };
        GeminiEmbedder::new(reqwest::Client::new(), &config, "key")
    }

    #[test]
    fn test_request_body_shape() {
        let e = embedder();
        let body = serde_json::to_value(e.request("bonjour", TaskType::RetrievalDocument)).unwrap();
        assert_eq!(body["model"], "models/gemini-embedding-001");
        assert_eq!(body["content"]["parts"][0]["text"], "bonjour");
        assert_eq!(body["taskType"], "RETRIEVAL_DOCUMENT");
        assert_eq!(body["outputDimensionality"], 4);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(embedder().base_url, "http://localhost:1/v1beta");
    }

    #[test]
    fn test_dimension_check() {
        let e = embedder();
        assert!(e.check_dimensions(&[0.0; 4]).is_ok());
        assert!(matches!(
            e.check_dimensions(&[0.0; 3]),
            Err(EmbedderError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        // base_url points at a closed port; any request would fail.
        let out = embedder().embed_batch(&[]).await.unwrap();
        assert!(out.is_empty());
    }
}
