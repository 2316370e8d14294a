//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! ll-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! The storefront keeps carts and wishlists in session records, so the only
//! schema is the `tower_sessions.session` table owned by the session store.

use secrecy::SecretString;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use leureluxe_storefront::db;

/// Errors running migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Create the session table if it does not exist.
///
/// # Errors
///
/// Returns an error if no database URL is configured, the database is
/// unreachable or the DDL fails.
pub async fn storefront() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("STOREFRONT_DATABASE_URL"))?;

    tracing::info!("Connecting to storefront database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Storefront migrations complete");
    Ok(())
}
