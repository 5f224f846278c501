//! MedVoice HTTP server.
//!
//! Serves the voice-platform webhooks and the dashboard CRUD endpoints.

use database::Database;
use tracing::info;

use api::{routes, AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting MedVoice server");

    if config.webhook_secret.is_none() {
        tracing::warn!("WEBHOOK_SECRET not set; webhook signatures will not be verified");
    }

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Build application state
    let state = AppState::new(db, &config);

    // Build router
    let app = routes::router().with_state(state);

    // Start server
    info!(addr = %config.addr, "MedVoice server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
