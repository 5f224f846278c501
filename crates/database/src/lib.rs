//! SQLite persistence layer for MedVoice.
//!
//! This crate provides async database operations for bots, patients, and
//! call logs using SQLx with SQLite. Lookup-style functions (`find_*`)
//! return `Option`; "not found" is a normal outcome for the webhook
//! resolvers, not an error. CRUD-style functions addressing a specific row
//! return [`DatabaseError::NotFound`] when the row is missing.
//!
//! # Example
//!
//! ```no_run
//! use database::{Database, models::NewBot, bot};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:medvoice.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let new_bot = NewBot {
//!         uid: "agent_7f3a".to_string(),
//!         name: "Triage Assistant".to_string(),
//!         prompt: "You are a medical triage assistant.".to_string(),
//!         domain: "medical".to_string(),
//!     };
//!     bot::create_bot(db.pool(), &new_bot).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod call_log;
pub mod error;
pub mod models;
pub mod patient;

pub use error::{DatabaseError, Result};
pub use models::{Bot, CallLogView, NewBot, NewCallLog, NewPatient, Patient};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Webhook handling is sequential per request, so a modest pool suffices.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/medvoice.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
