//! Webhook endpoints invoked by the voice-call platform.
//!
//! Handlers take the raw body bytes so the signature check covers exactly
//! what was sent. Order per request: rate limit, signature, JSON parse,
//! field validation, then the pipeline.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

use callflow::rate_limit::RateDecision;
use callflow::{
    client_identity, pipeline, validate_payload, verify_signature, CallflowError, WebhookPayload,
    SIGNATURE_HEADER,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Pre-call webhook: look the caller up and return context for the live
/// call. Resolution never rejects; handler errors degrade to a manual
/// fallback context.
pub async fn pre_call(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload = match gate(&state, "pre-call", &headers, &body) {
        Ok(payload) => payload,
        Err(response) => return response,
    };

    match pipeline::pre_call(state.db.pool(), &payload).await {
        Ok(outcome) => {
            state.monitoring.record_success("pre-call");
            pre_call_response(&payload, outcome)
        }
        Err(err) => {
            state
                .monitoring
                .record_error("pre-call", &err.to_string(), Some(request_context(&headers)));
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error",
                    "context": "System error occurred. Please proceed with the call and \
                                gather patient information manually.",
                })),
            )
                .into_response()
        }
    }
}

/// Post-call webhook: resolve the bot and patient, then record the call.
pub async fn post_call(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload = match gate(&state, "post-call", &headers, &body) {
        Ok(payload) => payload,
        Err(response) => return response,
    };

    match pipeline::post_call(state.db.pool(), &payload).await {
        Ok(outcome) => {
            state.monitoring.record_success("post-call");
            Json(json!({
                "success": true,
                "message": "Call logged successfully",
                "call_log_id": outcome.call_log_id,
                "bot": {
                    "uid": outcome.bot.uid(),
                    "name": outcome.bot.display_name(),
                },
            }))
            .into_response()
        }
        Err(err) => {
            state
                .monitoring
                .record_error("post-call", &err.to_string(), Some(request_context(&headers)));
            ApiError::Callflow(err).into_response()
        }
    }
}

/// Shared entry gate: rate limit, signature, parse, validate.
fn gate(
    state: &AppState,
    endpoint: &str,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<WebhookPayload, Response> {
    let identity = client_identity(
        header_str(headers, "x-forwarded-for"),
        header_str(headers, "x-real-ip"),
    );
    let decision = state.rate_limiter.check(&identity);
    if !decision.allowed {
        warn!(endpoint, %identity, "rate limit exceeded");
        return Err(rate_limited_response(state.rate_limiter.limit(), &decision));
    }

    let signature = header_str(headers, SIGNATURE_HEADER);
    if !verify_signature(
        body,
        signature,
        state.webhook_secret.as_deref(),
        state.signature_policy,
    ) {
        state.monitoring.record_error(
            endpoint,
            "invalid webhook signature",
            Some(request_context(headers)),
        );
        return Err(ApiError::Callflow(CallflowError::Authentication(
            "invalid webhook signature".to_string(),
        ))
        .into_response());
    }

    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid JSON payload" })),
            )
                .into_response())
        }
    };

    let check = validate_payload(&value);
    if !check.is_valid {
        return Err(ApiError::Callflow(CallflowError::Validation(check.errors)).into_response());
    }

    Ok(check.payload)
}

/// Shape the pre-call response for the calling platform: the structured
/// `call` wrapper gets `dynamic_variables`, everything else the flat form.
fn pre_call_response(payload: &WebhookPayload, outcome: pipeline::PreCallOutcome) -> Response {
    if payload.has_call_wrapper {
        let (name, medical_id) = match &outcome.patient {
            Some(patient) => (patient.name.clone(), patient.medical_id.clone()),
            None => (String::new(), String::new()),
        };
        return Json(json!({
            "call": {
                "dynamic_variables": {
                    "patient_name": name,
                    "medical_id": medical_id,
                    "context": outcome.context,
                }
            }
        }))
        .into_response();
    }

    Json(json!({
        "patient_data": outcome.patient,
        "context": outcome.context,
        "call_details": {
            "from": payload.from,
            "to": payload.to,
            "call_id": payload.call_id,
            "bot_id": payload.bot_id,
        }
    }))
    .into_response()
}

fn rate_limited_response(limit: u32, decision: &RateDecision) -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        [
            ("Retry-After", decision.retry_after_secs.to_string()),
            ("X-RateLimit-Limit", limit.to_string()),
            ("X-RateLimit-Remaining", "0".to_string()),
        ],
        Json(json!({
            "error": "Rate limit exceeded",
            "retryAfter": decision.retry_after_secs,
        })),
    )
        .into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Request context attached to monitoring entries.
fn request_context(headers: &HeaderMap) -> Value {
    json!({
        "method": "POST",
        "user_agent": header_str(headers, "user-agent"),
        "forwarded_for": header_str(headers, "x-forwarded-for"),
    })
}
