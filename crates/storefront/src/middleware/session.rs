//! Session middleware configuration.
//!
//! Sessions are the durable per-client storage for carts and wishlists, so
//! they expire on inactivity after 30 days rather than on browser close.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "ll_session";

/// Session expiry time in seconds (30 days).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// The `tower_sessions.session` table must exist (`ll-cli migrate`).
#[must_use]
pub fn create_session_layer(pool: &PgPool, base_url: &str) -> SessionManagerLayer<PostgresStore> {
    session_layer(PostgresStore::new(pool.clone()), base_url)
}

/// Apply the storefront cookie settings to any session store.
///
/// Cookies are marked `Secure` only when the storefront is served over HTTPS.
#[must_use]
pub fn session_layer<S: SessionStore + Clone>(store: S, base_url: &str) -> SessionManagerLayer<S> {
    let is_secure = base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
