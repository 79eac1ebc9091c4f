use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub language: String,
    pub sources: Vec<String>,
}

/// POST /chatbot: answer a visitor's question from the indexed portfolio.
pub async fn chatbot(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let service = state.chat_service().ok_or(ApiError::NotConfigured)?;
    let answer = service.answer(&req.query).await?;

    Ok(Json(ChatResponse {
        response: answer.response,
        language: answer.language,
        sources: answer.sources,
    }))
}
