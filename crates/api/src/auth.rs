//! Bearer-key authentication for the CRUD endpoints.

use axum::http::HeaderMap;
use tracing::warn;

use crate::error::ApiError;

/// Check the `Authorization: Bearer` header against the configured key.
///
/// With no key configured, authentication is skipped (open mode, logged
/// once per request). Webhook endpoints authenticate by signature instead
/// and never pass through here.
pub fn authorize(api_key: Option<&str>, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = api_key else {
        warn!("API key not configured, skipping authentication");
        return Ok(());
    };

    let Some(value) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Err(ApiError::Unauthorized);
    };

    let Ok(value) = value.to_str() else {
        return Err(ApiError::Unauthorized);
    };

    let token = value.strip_prefix("Bearer ").unwrap_or(value);
    if token != expected {
        return Err(ApiError::Unauthorized);
    }

    Ok(())
}
