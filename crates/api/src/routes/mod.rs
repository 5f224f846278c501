//! Route handlers for the MedVoice server.

pub mod bots;
pub mod call_logs;
pub mod health;
pub mod patients;
pub mod webhooks;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Platform webhooks
        .route("/api/webhooks/pre-call", post(webhooks::pre_call))
        .route("/api/webhooks/post-call", post(webhooks::post_call))
        .route("/api/functions/fetch-patient", post(patients::fetch_patient))
        // Dashboard CRUD
        .route("/api/bots", get(bots::list).post(bots::create))
        .route(
            "/api/bots/:id",
            get(bots::get).put(bots::update).delete(bots::delete),
        )
        .route("/api/call-logs", get(call_logs::list))
}
