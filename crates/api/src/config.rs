//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

use callflow::SignaturePolicy;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Shared secret for webhook signatures. Unset disables verification.
    pub webhook_secret: Option<String>,
    /// Bearer key for the CRUD endpoints. Unset disables authentication.
    pub api_key: Option<String>,
    /// URL receiving error alerts. Unset disables alerting.
    pub alert_webhook_url: Option<String>,
    /// What to do with unsigned webhooks when a secret is configured.
    pub signature_policy: SignaturePolicy,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `MEDVOICE_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:medvoice.db?mode=rwc` |
    /// | `WEBHOOK_SECRET` | Webhook signing secret | (unset: verification off) |
    /// | `API_KEY` | CRUD bearer key | (unset: auth off) |
    /// | `ALERT_WEBHOOK_URL` | Error alert target | (unset: alerting off) |
    /// | `WEBHOOK_ALLOW_UNSIGNED` | `1`/`true`: accept unsigned webhooks with a warning | reject |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("MEDVOICE_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:medvoice.db?mode=rwc".to_string());

        let webhook_secret = env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty());
        let api_key = env::var("API_KEY").ok().filter(|s| !s.is_empty());
        let alert_webhook_url = env::var("ALERT_WEBHOOK_URL").ok().filter(|s| !s.is_empty());

        let signature_policy = match env::var("WEBHOOK_ALLOW_UNSIGNED").ok().as_deref() {
            Some("1") | Some("true") => SignaturePolicy::AcceptAndWarn,
            _ => SignaturePolicy::Reject,
        };

        Ok(Self {
            addr,
            database_url,
            webhook_secret,
            api_key,
            alert_webhook_url,
            signature_policy,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid MEDVOICE_ADDR format")]
    InvalidAddr,
}
