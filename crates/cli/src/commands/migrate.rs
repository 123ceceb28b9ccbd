//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! rain-cli migrate sessions
//! ```
//!
//! # Environment Variables
//!
//! - `RAIN_ADVISORY_DATABASE_URL` (or `DATABASE_URL`) - session database
//!
//! Domain tables live in the hosted data service and are managed there; the
//! only local table is `tower_sessions.session`.

use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use rain_advisory_web::config::{ConfigError, session_database_url};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Create the session store schema and table.
///
/// Safe to run repeatedly; the store only creates what is missing.
///
/// # Errors
///
/// Returns `MigrationError` if the database URL is missing or the
/// connection or DDL fails.
pub async fn sessions() -> Result<(), MigrationError> {
    let database_url = session_database_url()?;

    tracing::info!("Connecting to session database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Session table ready");
    Ok(())
}
