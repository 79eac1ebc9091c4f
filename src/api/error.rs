use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::chat::ChatError;

pub const NOT_CONFIGURED: &str = "Le service Gemini n'est pas configuré (Clé API manquante).";
pub const GENERATION_FAILED: &str = "Erreur interne lors de la génération de la réponse.";
pub const EMPTY_QUERY: &str = "La question ne peut pas être vide.";

/// Errors returned by HTTP handlers, rendered as `{"detail": "..."}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{}", NOT_CONFIGURED)]
    NotConfigured,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{}", GENERATION_FAILED)]
    Generation,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Generation | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyQuery => ApiError::InvalidRequest(EMPTY_QUERY.to_string()),
            other => {
                error!("Chat request failed: {other}");
                ApiError::Generation
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::NotConfigured.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(ChatError::EmptyQuery).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(ChatError::Generation(LlmError::EmptyResponse))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(ApiError::NotConfigured.to_string(), NOT_CONFIGURED);
        assert_eq!(ApiError::from(ChatError::EmptyQuery).to_string(), EMPTY_QUERY);
        assert_eq!(
            ApiError::from(ChatError::Translation(LlmError::EmptyResponse)).to_string(),
            GENERATION_FAILED
        );
    }
}
