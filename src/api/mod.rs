//! HTTP surface: routes, CORS, and error mapping.
pub mod chat;
pub mod error;
pub mod health;
pub mod index;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/chatbot", post(chat::chatbot))
        .route("/health", get(health::health))
        .route("/index", post(index::reindex))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o.trim() == "*") {
        return base.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o.trim()) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {o:?}: {e}");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(parsed))
}
