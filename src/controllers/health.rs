use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::domain::synthesis::SynthesisService;

/// Liveness plus model status. Always 200 so the process is not restarted
/// while the backend loads.
pub async fn health(State(service): State<Arc<SynthesisService>>) -> impl IntoResponse {
    let backend = service.backend();

    let body = if backend.is_ready() {
        json!({
            "status": "healthy",
            "model_loaded": true,
            "message": "API and speech backend are running"
        })
    } else {
        let message = match backend.load_error() {
            Some(err) => format!("Speech backend failed to load: {}", err),
            None => "Speech backend not loaded yet".to_string(),
        };
        json!({
            "status": "unhealthy",
            "model_loaded": false,
            "message": message
        })
    };

    (StatusCode::OK, Json(body))
}

pub async fn health_ready(State(service): State<Arc<SynthesisService>>) -> impl IntoResponse {
    let pending = service.pending_syntheses();

    match service.backend().name() {
        Some(name) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "backend": name,
                "pending_syntheses": pending
            })),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "backend": "unavailable",
                "pending_syntheses": pending
            })),
        ),
    }
}
