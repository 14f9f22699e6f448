//! Health check HTTP handler

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::web::AppState;

/// Report renderer availability, asset origins and cache counters.
/// Responds 503 when the renderer failed to initialize.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.placeholder() {
        Some(service) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "sources": service.sources(),
                "cache": service.cache_stats(),
            })),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "version": env!("CARGO_PKG_VERSION"),
                "error": state.startup_error(),
            })),
        ),
    }
}
