//! Session-backed client store.
//!
//! [`ClientStore`] loads the [`StoreState`] of the requesting browser from its
//! session record, hydrates it (a first visit gets a guest id) and writes the
//! whole record back after every mutation.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use leureluxe_core::store::StoreState;
use thiserror::Error;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::session_keys;

/// Errors reading or writing the persisted store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request was not routed through the session layer.
    #[error("session layer is not installed")]
    MissingSession,

    /// The session backend failed to load or save the record.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// The requesting client's cart and wishlist state.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(mut store: ClientStore) -> Result<(), AppError> {
///     store.update(StoreState::reset_cart).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct ClientStore {
    session: Session,
    state: StoreState,
}

impl ClientStore {
    /// Restore the state from `session`, generating a guest id on first use.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Session`] if the record cannot be read or the
    /// hydrated state cannot be saved.
    pub async fn load(session: Session) -> Result<Self, StoreError> {
        let mut state: StoreState = session
            .get(session_keys::CART_STORAGE)
            .await?
            .unwrap_or_default();

        let hydrated = state.hydrate();
        let store = Self { session, state };
        if hydrated {
            tracing::debug!(user_id = ?store.state.current_user_id(), "New guest client");
            store.persist().await?;
        }
        Ok(store)
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &StoreState {
        &self.state
    }

    /// Apply a mutation and persist the full record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Session`] if the record cannot be saved. The
    /// in-memory state keeps the mutation either way.
    pub async fn update<R>(
        &mut self,
        mutate: impl FnOnce(&mut StoreState) -> R,
    ) -> Result<R, StoreError> {
        let result = mutate(&mut self.state);
        self.persist().await?;
        Ok(result)
    }

    async fn persist(&self) -> Result<(), StoreError> {
        self.session
            .insert(session_keys::CART_STORAGE, &self.state)
            .await?;
        Ok(())
    }
}

impl<S> FromRequestParts<S> for ClientStore
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Session is set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(StoreError::MissingSession)?;

        Ok(Self::load(session).await?)
    }
}
