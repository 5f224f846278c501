//! Webhook ingestion pipeline for MedVoice.
//!
//! This crate turns raw webhook requests from the voice-call platform into
//! resolved, recorded call events. The HTTP layer hands in raw bytes and
//! headers; everything security- or heuristics-shaped lives here.
//!
//! # Architecture
//!
//! ```text
//! Inbound webhook (from crates/api)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        CALLFLOW                             │
//! │                                                             │
//! │  1. Rate limiter: per-caller fixed-window counter           │
//! │         ↓                                                   │
//! │  2. Signature verifier: HMAC-SHA256 over the raw body       │
//! │         ↓                                                   │
//! │  3. Payload validator: type-check + sanitize fields         │
//! │         ↓                                                   │
//! │  4a. Pre-call: patient lookup → context string              │
//! │  4b. Post-call: bot resolver → patient resolver → recorder  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Resolution is best-effort by design: a post-call event with a known
//! caller but an unknown bot is still recorded (against the placeholder
//! reference), while a payload carrying no identification at all is
//! rejected outright.

pub mod bot_resolver;
pub mod error;
pub mod extract;
pub mod monitoring;
pub mod patient_resolver;
pub mod payload;
pub mod pipeline;
pub mod rate_limit;
pub mod recorder;
pub mod sanitize;
pub mod signature;

pub use bot_resolver::{BotRef, PLACEHOLDER_BOT_UID};
pub use error::{CallflowError, Result};
pub use monitoring::{EndpointMetric, Monitoring};
pub use patient_resolver::{PatientLookup, ResolvedPatient, NO_PATIENT_CONTEXT};
pub use payload::{validate_payload, PayloadCheck, WebhookPayload};
pub use pipeline::{PostCallOutcome, PreCallOutcome};
pub use rate_limit::{client_identity, RateDecision, RateLimiter};
pub use signature::{verify_signature, SignaturePolicy, SIGNATURE_HEADER};
