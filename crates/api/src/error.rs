//! Error types for the HTTP layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use callflow::CallflowError;

/// Errors that can leave a handler.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Pipeline error; mapped to a status by taxonomy.
    #[error(transparent)]
    Callflow(#[from] CallflowError),

    /// Database error outside the pipeline (CRUD handlers).
    #[error("Database error: {0}")]
    Database(#[from] database::DatabaseError),

    /// Missing or wrong bearer key.
    #[error("Unauthorized")]
    Unauthorized,

    /// Malformed client request.
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Callflow(err) => return callflow_response(err),
            ApiError::Database(database::DatabaseError::NotFound { entity, .. }) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": format!("{entity} not found") }),
            ),
            ApiError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "Internal server error" }),
                )
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "error": "Unauthorized" }),
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": msg }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Map a pipeline error onto the HTTP taxonomy.
fn callflow_response(err: &CallflowError) -> Response {
    match err {
        CallflowError::Authentication(_) => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "Invalid webhook signature" })),
        )
            .into_response(),
        CallflowError::Validation(errors) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Validation failed",
                "details": errors,
            })),
        )
            .into_response(),
        CallflowError::BotResolution(msg) | CallflowError::PatientResolution(msg) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": msg })),
        )
            .into_response(),
        CallflowError::Persistence(db_err) => {
            tracing::error!("Persistence error: {}", db_err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Failed to log call" })),
            )
                .into_response()
        }
        CallflowError::RateLimited { retry_after_secs } => (
            StatusCode::TOO_MANY_REQUESTS,
            [("Retry-After", retry_after_secs.to_string())],
            Json(serde_json::json!({
                "error": "Rate limit exceeded",
                "retryAfter": retry_after_secs,
            })),
        )
            .into_response(),
    }
}

/// Result type for handler operations.
pub type Result<T> = std::result::Result<T, ApiError>;
