use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Generator, LlmError};
use crate::config::GeminiConfig;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Result<String, LlmError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(LlmError::Blocked(reason));
        }

        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Generator backed by `models/{model}:generateContent`.
pub struct GeminiGenerator {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl GeminiGenerator {
    pub fn new(client: reqwest::Client, config: &GeminiConfig, api_key: impl Into<String>) -> Self {
        Self {
            client,
            url: format!(
                "{}/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.generation_model
            ),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let req = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let resp = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateResponse = resp.json().await?;
        body.into_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<String, LlmError> {
        serde_json::from_str::<GenerateResponse>(json)
            .unwrap()
            .into_text()
    }

    #[test]
    fn test_url() {
        let config = GeminiConfig {
            base_url: "https://example.test/v1beta/".to_string(),
            ..GeminiConfig::default()
        };
        let g = GeminiGenerator::new(reqwest::Client::new(), &config, "k");
        assert_eq!(
            g.url,
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_joins_parts_of_first_candidate() {
        let text = parse(
            r#"{"candidates":[
                {"content":{"parts":[{"text":"Bonjour "},{"text":"le monde"}]}},
                {"content":{"parts":[{"text":"ignored"}]}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(text, "Bonjour le monde");
    }

    #[test]
    fn test_blocked_prompt() {
        let err = parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap_err();
        assert!(matches!(err, LlmError::Blocked(r) if r == "SAFETY"));
    }

    #[test]
    fn test_empty_response() {
        assert!(matches!(parse(r#"{}"#), Err(LlmError::EmptyResponse)));
        assert!(matches!(
            parse(r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#),
            Err(LlmError::EmptyResponse)
        ));
    }

    #[test]
    fn test_request_shape() {
        let req = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: "hi" }],
            }],
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["contents"][0]["role"], "user");
        assert_eq!(v["contents"][0]["parts"][0]["text"], "hi");
    }
}
