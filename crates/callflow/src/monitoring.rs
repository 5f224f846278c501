//! Error metrics and outbound alerting.
//!
//! Every handler reports its outcome here. Errors bump a per-endpoint
//! counter and, when an alert webhook is configured, fire a
//! forget-on-failure POST with the current metrics snapshot. The service is
//! injected into handlers rather than living in a global, so tests see only
//! their own state.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

/// Rolling error state for one endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EndpointMetric {
    /// Consecutive errors since the last success.
    pub count: u32,
    /// Message of the most recent error.
    pub last_error: Option<String>,
    /// RFC 3339 timestamp of the most recent error.
    pub last_error_time: Option<String>,
}

/// Per-endpoint error tracking with optional webhook alerting.
pub struct Monitoring {
    alert_webhook_url: Option<String>,
    client: reqwest::Client,
    metrics: Mutex<HashMap<String, EndpointMetric>>,
}

impl Monitoring {
    pub fn new(alert_webhook_url: Option<String>) -> Self {
        Self {
            alert_webhook_url,
            client: reqwest::Client::new(),
            metrics: Mutex::new(HashMap::new()),
        }
    }

    /// Record a handler failure with whatever request context is available.
    pub fn record_error(&self, endpoint: &str, message: &str, context: Option<Value>) {
        error!(endpoint, %message, ?context, "request failed");

        let snapshot = {
            let mut metrics = self
                .metrics
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let metric = metrics.entry(endpoint.to_string()).or_default();
            metric.count += 1;
            metric.last_error = Some(message.to_string());
            metric.last_error_time = Some(Utc::now().to_rfc3339());
            metrics.clone()
        };

        if let Some(url) = &self.alert_webhook_url {
            self.send_alert(url.clone(), endpoint.to_string(), message.to_string(), context, snapshot);
        }
    }

    /// Record a handler success, clearing the endpoint's error streak.
    pub fn record_success(&self, endpoint: &str) {
        let mut metrics = self
            .metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(metric) = metrics.get_mut(endpoint) {
            metric.count = 0;
        }
    }

    /// Snapshot of all endpoint metrics.
    pub fn metrics(&self) -> HashMap<String, EndpointMetric> {
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// POST an alert to the configured webhook. Fire-and-forget: a failed
    /// alert is logged and never propagates into request handling.
    fn send_alert(
        &self,
        url: String,
        endpoint: String,
        message: String,
        context: Option<Value>,
        metrics: HashMap<String, EndpointMetric>,
    ) {
        let client = self.client.clone();
        let body = serde_json::json!({
            "alert": "API Error",
            "endpoint": endpoint,
            "error": message,
            "context": context,
            "timestamp": Utc::now().to_rfc3339(),
            "metrics": metrics,
        });

        tokio::spawn(async move {
            if let Err(err) = client.post(&url).json(&body).send().await {
                warn!(%err, "failed to send alert");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_accumulate_per_endpoint() {
        let monitoring = Monitoring::new(None);

        monitoring.record_error("post-call", "boom", None);
        monitoring.record_error("post-call", "boom again", None);
        monitoring.record_error("pre-call", "other", None);

        let metrics = monitoring.metrics();
        assert_eq!(metrics["post-call"].count, 2);
        assert_eq!(metrics["post-call"].last_error.as_deref(), Some("boom again"));
        assert!(metrics["post-call"].last_error_time.is_some());
        assert_eq!(metrics["pre-call"].count, 1);
    }

    #[test]
    fn success_resets_the_streak() {
        let monitoring = Monitoring::new(None);

        monitoring.record_error("post-call", "boom", None);
        monitoring.record_success("post-call");

        let metrics = monitoring.metrics();
        assert_eq!(metrics["post-call"].count, 0);
        // Last-error details survive the reset for inspection.
        assert_eq!(metrics["post-call"].last_error.as_deref(), Some("boom"));
    }

    #[test]
    fn success_on_untracked_endpoint_is_a_no_op() {
        let monitoring = Monitoring::new(None);
        monitoring.record_success("never-seen");
        assert!(monitoring.metrics().is_empty());
    }
}
