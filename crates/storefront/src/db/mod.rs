//! Database access for the storefront `PostgreSQL`.
//!
//! The only table is `tower_sessions.session`, which holds one record per
//! browser; each record carries the `cart-storage` document. Products live in
//! the CMS and orders in Stripe.
//!
//! # Migrations
//!
//! The session table is created by:
//! ```bash
//! cargo run -p leureluxe-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Check that the database answers a trivial query.
///
/// # Errors
///
/// Returns `sqlx::Error` if no connection can be acquired or the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
