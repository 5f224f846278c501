//! Application state shared across handlers.

use std::sync::Arc;

use callflow::{Monitoring, RateLimiter, SignaturePolicy};
use database::Database;

use crate::config::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Per-caller request limiter.
    pub rate_limiter: Arc<RateLimiter>,
    /// Error metrics and alerting.
    pub monitoring: Arc<Monitoring>,
    /// Webhook signing secret, if configured.
    pub webhook_secret: Option<String>,
    /// CRUD bearer key, if configured.
    pub api_key: Option<String>,
    /// Unsigned-webhook policy.
    pub signature_policy: SignaturePolicy,
}

impl AppState {
    /// Create new application state from configuration.
    pub fn new(db: Database, config: &Config) -> Self {
        Self {
            db,
            rate_limiter: Arc::new(RateLimiter::with_defaults()),
            monitoring: Arc::new(Monitoring::new(config.alert_webhook_url.clone())),
            webhook_secret: config.webhook_secret.clone(),
            api_key: config.api_key.clone(),
            signature_policy: config.signature_policy,
        }
    }
}
