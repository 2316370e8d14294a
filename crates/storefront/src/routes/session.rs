//! Shopper identity handlers.
//!
//! Authentication itself happens at the identity provider; the client reports
//! the resulting user id here. Signing in moves a guest's cart and wishlist to
//! that id. Signing out starts a fresh guest, leaving the signed-out user's
//! data in the record for their next sign-in.

use axum::Json;
use leureluxe_core::UserId;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::services::ClientStore;

/// Body for signing in.
#[derive(Debug, Deserialize)]
pub struct SignIn {
    pub user_id: String,
}

/// Active shopper identity.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub user_id: Option<UserId>,
    pub is_guest: bool,
    /// Whether a guest cart was carried over by this request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrated: Option<bool>,
}

impl SessionView {
    fn new(store: &ClientStore, migrated: Option<bool>) -> Self {
        let user_id = store.state().current_user_id().cloned();
        Self {
            is_guest: user_id.as_ref().is_some_and(UserId::is_guest),
            user_id,
            migrated,
        }
    }
}

/// Current identity.
#[instrument(skip(store))]
pub async fn show(store: ClientStore) -> Json<SessionView> {
    Json(SessionView::new(&store, None))
}

/// Switch to an authenticated user, migrating guest data if the client was a guest.
#[instrument(skip(store, body))]
pub async fn sign_in(
    mut store: ClientStore,
    Json(body): Json<SignIn>,
) -> Result<Json<SessionView>> {
    let user_id = body.user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::BadRequest("user_id is required".to_string()));
    }
    let user_id = UserId::new(user_id);
    if user_id.is_guest() {
        return Err(AppError::BadRequest(
            "user_id must be an authenticated id".to_string(),
        ));
    }

    let migrated = store
        .update(|state| {
            let migrated = state.migrate_guest_to_user(user_id.clone());
            if !migrated {
                state.set_current_user(Some(user_id.clone()));
            }
            migrated
        })
        .await?;

    set_sentry_user(&user_id);
    tracing::info!(user_id = %user_id, migrated, "Shopper signed in");
    Ok(Json(SessionView::new(&store, Some(migrated))))
}

/// Drop the authenticated user and continue as a new guest.
#[instrument(skip(store))]
pub async fn sign_out(mut store: ClientStore) -> Result<Json<SessionView>> {
    store
        .update(|state| state.set_current_user(Some(UserId::guest())))
        .await?;

    clear_sentry_user();
    Ok(Json(SessionView::new(&store, None)))
}
