//! Error types for the webhook pipeline.

use thiserror::Error;

/// Errors that can occur while processing a webhook.
#[derive(Debug, Error)]
pub enum CallflowError {
    /// Signature or bearer-key check failed. Not retryable.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Payload failed format rules; carries the field-level error list.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// No bot could be determined from the payload.
    #[error("bot identification failed: {0}")]
    BotResolution(String),

    /// No patient could be determined from the payload.
    #[error("patient identification failed: {0}")]
    PatientResolution(String),

    /// A data-access call failed. Surfaced as a server error, not retried.
    #[error("persistence failed: {0}")]
    Persistence(#[from] database::DatabaseError),

    /// Caller exceeded its request budget for the current window.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, CallflowError>;
