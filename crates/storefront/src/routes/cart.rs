//! Cart route handlers.
//!
//! Every handler works on the requesting client's [`ClientStore`]; mutations
//! are persisted to the session before the updated cart is returned.

use axum::{
    Json,
    extract::{Path, State},
};
use leureluxe_core::image::ImageUrlBuilder;
use leureluxe_core::store::StoreState;
use leureluxe_core::{Product, ProductId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::products::ProductView;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::ClientStore;
use crate::state::AppState;

/// Body for adding a product to the cart or wishlist.
#[derive(Debug, Deserialize)]
pub struct ProductRef {
    pub product_id: ProductId,
}

/// One cart line.
#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub product: ProductView,
    pub quantity: u32,
    pub line_total: Decimal,
}

/// The active user's cart.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub user_id: Option<UserId>,
    pub items: Vec<CartLineView>,
    /// Sum of quantities across lines.
    pub count: u32,
    pub subtotal: Decimal,
    pub total: Decimal,
}

impl CartView {
    #[must_use]
    pub fn new(state: &StoreState, images: &ImageUrlBuilder) -> Self {
        let items = state
            .grouped_items()
            .into_iter()
            .map(|item| CartLineView {
                line_total: item.line_total(),
                quantity: item.quantity,
                product: ProductView::new(item.product, images),
            })
            .collect();

        Self {
            user_id: state.current_user_id().cloned(),
            items,
            count: state.total_quantity(),
            subtotal: state.sub_total_price(),
            total: state.total_price(),
        }
    }
}

/// Quantity of a single product in the cart.
#[derive(Debug, Serialize)]
pub struct ItemCountView {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Fetch a product from the catalog, or 404.
pub(super) async fn find_product(state: &AppState, product_id: &ProductId) -> Result<Product> {
    state
        .content()
        .product_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))
}

/// Show the cart.
#[instrument(skip(state, store))]
pub async fn show(State(state): State<AppState>, store: ClientStore) -> Json<CartView> {
    Json(CartView::new(store.state(), state.images()))
}

/// Add one unit of a product.
#[instrument(skip(state, store), fields(product_id = %body.product_id))]
pub async fn add(
    State(state): State<AppState>,
    mut store: ClientStore,
    Json(body): Json<ProductRef>,
) -> Result<Json<CartView>> {
    let product = find_product(&state, &body.product_id).await?;
    store.update(|s| s.add_to_cart(product)).await?;

    add_breadcrumb("cart", "Added to cart", &[("product_id", body.product_id.as_str())]);
    Ok(Json(CartView::new(store.state(), state.images())))
}

/// Remove a product line entirely.
#[instrument(skip(state, store))]
pub async fn remove(
    State(state): State<AppState>,
    mut store: ClientStore,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    store.update(|s| s.delete_cart_product(&product_id)).await?;
    Ok(Json(CartView::new(store.state(), state.images())))
}

/// Empty the cart.
#[instrument(skip(state, store))]
pub async fn clear(
    State(state): State<AppState>,
    mut store: ClientStore,
) -> Result<Json<CartView>> {
    store.update(StoreState::reset_cart).await?;
    Ok(Json(CartView::new(store.state(), state.images())))
}

/// Quantity of one product.
#[instrument(skip(store))]
pub async fn item_count(
    store: ClientStore,
    Path(product_id): Path<ProductId>,
) -> Json<ItemCountView> {
    let quantity = store.state().item_count(&product_id);
    Json(ItemCountView {
        product_id,
        quantity,
    })
}
