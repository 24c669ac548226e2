// src/handlers/system.rs

use axum::{Json, response::IntoResponse};
use serde_json::json;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Testing Learning Platform API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "working",
    }))
}

/// Liveness probe. Always healthy; touches no state.
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
    }))
}
