//! Health check endpoint.

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Health {
    status: String,
}

/// GET /health
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}
