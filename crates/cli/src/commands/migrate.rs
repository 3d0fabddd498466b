//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! shipdesk migrate
//! ```
//!
//! # Environment Variables
//!
//! - `SHIPDESK_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! `crates/server/migrations/`, embedded at build time.

use thiserror::Error;

use shipdesk_server::db::create_pool;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: SHIPDESK_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply all pending shipment-store migrations.
///
/// # Errors
///
/// Returns error if the database URL is unset, the database is unreachable,
/// or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = super::database_url().ok_or(MigrationError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to shipment database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running shipment migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Shipment migrations complete!");
    Ok(())
}
