//! Webhook payload validation and canonicalization.
//!
//! The call platform posts loosely-shaped JSON. This module type-checks the
//! recognized fields, sanitizes every string, and produces the canonical
//! [`WebhookPayload`] the resolvers work from. Unrecognized fields are
//! ignored; absent optional fields are not an error.

use chrono::DateTime;
use serde::Serialize;
use serde_json::Value;

use crate::sanitize::{is_valid_medical_id, is_valid_phone, normalize_medical_id, sanitize_text};

/// Canonical, sanitized webhook payload.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WebhookPayload {
    /// Platform call identifier.
    pub call_id: Option<String>,
    /// Bot identifier as supplied by the platform.
    pub bot_id: Option<String>,
    /// Caller phone number (pre-call).
    pub from: Option<String>,
    /// Callee phone number (pre-call).
    pub to: Option<String>,
    /// Normalized transcript text.
    pub transcript: Option<String>,
    /// Call summary.
    pub summary: Option<String>,
    /// Call duration in seconds.
    pub duration: Option<f64>,
    /// Platform-reported call status.
    pub status: Option<String>,
    /// Opaque platform metadata, passed through unchanged.
    pub metadata: Option<Value>,
    /// Structured function-call records, passed through unchanged.
    pub function_calls: Option<Value>,
    /// Canonical medical ID from `medical_id` or `patient_id`.
    pub medical_id: Option<String>,
    /// Caller name hint from the payload or its `call` wrapper.
    pub customer_name: Option<String>,
    /// Bot name hint from the payload or its `call` wrapper.
    pub bot_name: Option<String>,
    /// Dial attempt counter from the `call` wrapper.
    pub attempt: Option<i64>,
    /// Whether the request carried the structured `call` wrapper. Decides
    /// the pre-call response shape.
    pub has_call_wrapper: bool,
}

/// Outcome of payload validation.
#[derive(Debug, Clone)]
pub struct PayloadCheck {
    /// False when any recognized field failed its format rule.
    pub is_valid: bool,
    /// The sanitized payload. Only meaningful when `is_valid` is true.
    pub payload: WebhookPayload,
    /// Field-level error messages for the client.
    pub errors: Vec<String>,
}

/// Validate and sanitize a parsed webhook body.
pub fn validate_payload(body: &Value) -> PayloadCheck {
    let mut errors = Vec::new();
    let mut payload = WebhookPayload::default();

    payload.call_id =
        sanitized_field(body, "call_id").or_else(|| sanitized_field(body, "session_id"));
    payload.bot_id = sanitized_field(body, "bot_id");

    if let Some(from) = sanitized_field(body, "from") {
        if !is_valid_phone(&from) {
            errors.push("Invalid phone number format".to_string());
        }
        payload.from = Some(from);
    }

    payload.to = sanitized_field(body, "to");

    if let Some(transcript) = body.get("transcript") {
        match normalize_transcript(transcript) {
            Some(text) => payload.transcript = Some(text),
            None => errors.push("Invalid transcript format".to_string()),
        }
    }

    payload.summary = sanitized_field(body, "summary");

    if let Some(duration) = body.get("duration") {
        match parse_duration(duration) {
            Some(secs) => payload.duration = Some(secs),
            None => errors.push("Invalid duration".to_string()),
        }
    }

    // Platforms that send start/end timestamps instead of a duration.
    if payload.duration.is_none() {
        payload.duration = duration_from_timestamps(body);
    }

    payload.status = sanitized_field(body, "status");
    payload.metadata = body.get("metadata").cloned();
    payload.function_calls = body.get("function_calls").cloned();

    // `medical_id` wins over the platform's legacy `patient_id` alias.
    for field in ["patient_id", "medical_id"] {
        if let Some(id) = sanitized_field(body, field) {
            if is_valid_medical_id(&id) {
                payload.medical_id = Some(normalize_medical_id(&id));
            } else {
                errors.push("Invalid medical ID format".to_string());
            }
        }
    }

    // Some platform variants nest the post-call results under `analysis`.
    if let Some(analysis) = body.get("analysis").filter(|v| v.is_object()) {
        if payload.summary.is_none() {
            payload.summary = sanitized_field(analysis, "summary");
        }
        if payload.medical_id.is_none() {
            if let Some(id) = analysis
                .get("structured_data")
                .and_then(|sd| sd.get("medical_id"))
                .and_then(Value::as_str)
            {
                let id = normalize_medical_id(&sanitize_text(id));
                // Heuristic source: a malformed value is dropped, not an error.
                if is_valid_medical_id(&id) {
                    payload.medical_id = Some(id);
                }
            }
        }
    }

    payload.customer_name = sanitized_field(body, "customer_name");
    payload.bot_name = sanitized_field(body, "bot_name");

    if let Some(call) = body.get("call").filter(|v| v.is_object()) {
        payload.has_call_wrapper = true;
        if payload.customer_name.is_none() {
            payload.customer_name = sanitized_field(call, "customer_name");
        }
        if payload.bot_name.is_none() {
            payload.bot_name = sanitized_field(call, "bot_name");
        }
        payload.attempt = call.get("attempt").and_then(Value::as_i64);
    }

    PayloadCheck {
        is_valid: errors.is_empty(),
        payload,
        errors,
    }
}

/// Pull a string field and sanitize it. Empty-after-sanitization collapses
/// to `None`.
fn sanitized_field(body: &Value, field: &str) -> Option<String> {
    let text = body.get(field)?.as_str()?;
    let clean = sanitize_text(text);
    if clean.is_empty() {
        None
    } else {
        Some(clean)
    }
}

/// Normalize a transcript to plain text.
///
/// The platform sends either a single string or an ordered sequence of
/// `[speaker, message]` pairs; pairs are flattened to "speaker: message"
/// lines. Anything else is a format error.
fn normalize_transcript(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(sanitize_text(text)),
        Value::Array(turns) => {
            let mut lines = Vec::with_capacity(turns.len());
            for turn in turns {
                let pair = turn.as_array()?;
                let (speaker, message) = (pair.first()?.as_str()?, pair.get(1)?.as_str()?);
                lines.push(format!("{}: {}", sanitize_text(speaker), sanitize_text(message)));
            }
            Some(lines.join("\n"))
        }
        _ => None,
    }
}

/// Derive a duration from `started_at`/`ended_at` RFC 3339 timestamps.
fn duration_from_timestamps(body: &Value) -> Option<f64> {
    let start = body.get("started_at")?.as_str()?;
    let end = body.get("ended_at")?.as_str()?;

    let start = DateTime::parse_from_rfc3339(start).ok()?;
    let end = DateTime::parse_from_rfc3339(end).ok()?;

    let secs = (end - start).num_milliseconds() as f64 / 1000.0;
    if secs >= 0.0 {
        Some(secs)
    } else {
        None
    }
}

/// Parse a duration as a non-negative number of seconds. Accepts numeric
/// JSON values and numeric strings.
fn parse_duration(value: &Value) -> Option<f64> {
    let secs = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };

    if secs.is_finite() && secs >= 0.0 {
        Some(secs)
    } else {
        None
    }
}
