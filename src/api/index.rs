use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::error;

use super::error::ApiError;
use crate::indexer::core::IndexReport;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct IndexParams {
    #[serde(default)]
    pub force: bool,
}

/// POST /index: re-scan the content directory.
pub async fn reindex(
    State(state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Result<Json<IndexReport>, ApiError> {
    match state.reindex(params.force).await {
        None => Err(ApiError::NotConfigured),
        Some(Ok(report)) => Ok(Json(report)),
        Some(Err(e)) => {
            error!("Indexing failed: {e:#}");
            Err(ApiError::Internal("indexing failed".to_string()))
        }
    }
}
