//! Health check handlers.

use axum::extract::State;
use axum::http::StatusCode;

use crate::db;
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable, since
/// carts cannot be loaded without it.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match db::ping(state.pool()).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
