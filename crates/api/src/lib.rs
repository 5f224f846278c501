//! MedVoice HTTP server: webhook and CRUD endpoints.
//!
//! The binary in `main.rs` wires configuration, the database, and the
//! router together; everything else lives here so integration tests can
//! drive the router directly.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::ApiError;
pub use state::AppState;
