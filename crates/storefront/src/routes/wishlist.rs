//! Wishlist route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use leureluxe_core::store::StoreState;
use leureluxe_core::{ProductId, UserId};
use serde::Serialize;
use tracing::instrument;

use super::cart::{ProductRef, find_product};
use super::products::ProductView;
use crate::error::{Result, add_breadcrumb};
use crate::services::ClientStore;
use crate::state::AppState;

/// The active user's wishlist.
#[derive(Debug, Serialize)]
pub struct WishlistView {
    pub user_id: Option<UserId>,
    pub items: Vec<ProductView>,
}

impl WishlistView {
    fn new(store: &ClientStore, state: &AppState) -> Self {
        Self {
            user_id: store.state().current_user_id().cloned(),
            items: ProductView::list(store.state().wishlist().iter().cloned(), state.images()),
        }
    }
}

/// Whether a single product is on the wishlist.
#[derive(Debug, Serialize)]
pub struct WishlistedView {
    pub product_id: ProductId,
    pub wishlisted: bool,
}

/// Show the wishlist.
#[instrument(skip(state, store))]
pub async fn show(State(state): State<AppState>, store: ClientStore) -> Json<WishlistView> {
    Json(WishlistView::new(&store, &state))
}

/// Add a product; adding it twice keeps one entry.
#[instrument(skip(state, store), fields(product_id = %body.product_id))]
pub async fn add(
    State(state): State<AppState>,
    mut store: ClientStore,
    Json(body): Json<ProductRef>,
) -> Result<Json<WishlistView>> {
    let product = find_product(&state, &body.product_id).await?;
    store.update(|s| s.add_to_wishlist(product)).await?;

    add_breadcrumb("wishlist", "Added to wishlist", &[("product_id", body.product_id.as_str())]);
    Ok(Json(WishlistView::new(&store, &state)))
}

/// Remove a product.
#[instrument(skip(state, store))]
pub async fn remove(
    State(state): State<AppState>,
    mut store: ClientStore,
    Path(product_id): Path<ProductId>,
) -> Result<Json<WishlistView>> {
    store.update(|s| s.remove_from_wishlist(&product_id)).await?;
    Ok(Json(WishlistView::new(&store, &state)))
}

/// Empty the wishlist.
#[instrument(skip(state, store))]
pub async fn clear(
    State(state): State<AppState>,
    mut store: ClientStore,
) -> Result<Json<WishlistView>> {
    store.update(StoreState::reset_wishlist).await?;
    Ok(Json(WishlistView::new(&store, &state)))
}

/// Whether one product is on the wishlist.
#[instrument(skip(store))]
pub async fn contains(
    store: ClientStore,
    Path(product_id): Path<ProductId>,
) -> Json<WishlistedView> {
    let wishlisted = store.state().is_wishlisted(&product_id);
    Json(WishlistedView {
        product_id,
        wishlisted,
    })
}
