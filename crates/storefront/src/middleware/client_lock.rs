//! Per-client request serialization.
//!
//! A browser's cart and wishlist live in one session record that is read at
//! the start of a request and written back when the response leaves the
//! session layer. Two overlapping requests from the same browser would each
//! write their own copy and the later one would drop the other's change, so
//! requests carrying the same session cookie run one at a time.
//!
//! This layer must sit outside the session layer: the lock is released only
//! after the record has been saved.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use moka::future::Cache;
use tokio::sync::Mutex;

use super::SESSION_COOKIE_NAME;
use crate::state::AppState;

/// Locks are dropped after this long without a request from the client.
const LOCK_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// One async mutex per session cookie value.
#[derive(Clone)]
pub struct ClientLocks {
    locks: Cache<String, Arc<Mutex<()>>>,
}

impl ClientLocks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: Cache::builder().time_to_idle(LOCK_IDLE_TIMEOUT).build(),
        }
    }

    /// The lock for `session`, created on first use.
    pub async fn lock_for(&self, session: &str) -> Arc<Mutex<()>> {
        self.locks
            .get_with(session.to_string(), async { Arc::new(Mutex::new(())) })
            .await
    }
}

impl Default for ClientLocks {
    fn default() -> Self {
        Self::new()
    }
}

/// Session cookie value of a request, if it carries one.
fn session_cookie(request: &Request) -> Option<String> {
    request
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE_NAME && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Middleware that runs requests from the same session sequentially.
///
/// Requests without a session cookie belong to a client that has no record
/// yet and pass straight through.
pub async fn serialize_client_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(session) = session_cookie(&request) else {
        return next.run(request).await;
    };

    let lock = state.client_locks().lock_for(&session).await;
    let _guard = lock.lock().await;
    next.run(request).await
}
