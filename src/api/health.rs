use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub gemini_configured: bool,
    pub documents: usize,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let documents = {
        let db = state.db.lock().await;
        db.count_documents(&state.config.collection)
            .map_err(|e| ApiError::Internal(format!("database error: {e}")))?
    };

    Ok(Json(HealthResponse {
        status: "ok",
        gemini_configured: state.chat_service().is_some(),
        documents,
    }))
}
