//! Checkout handler.
//!
//! Items and subtotal come from the client's cart; the caller supplies the
//! order details and, when a discount applies, the discounted total.

use axum::{Json, extract::State};
use leureluxe_core::Address;
use leureluxe_core::checkout::CheckoutMetadata;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::services::ClientStore;
use crate::state::AppState;

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub discount_code: Option<String>,
    /// Amount to charge after discounts; defaults to the cart total.
    #[serde(default)]
    pub total: Option<Decimal>,
}

/// Where to send the shopper next.
#[derive(Debug, Serialize)]
pub struct CheckoutRedirect {
    pub url: String,
}

/// Create a hosted checkout session for the cart.
#[instrument(skip(state, store, body), fields(order_number = %body.order_number))]
pub async fn create(
    State(state): State<AppState>,
    store: ClientStore,
    Json(body): Json<CheckoutBody>,
) -> Result<Json<CheckoutRedirect>> {
    let cart = store.state();
    let items = cart.grouped_items();

    // Only authenticated ids are meaningful to the order system
    let user_id = cart.current_user_id().filter(|id| !id.is_guest()).cloned();

    let metadata = CheckoutMetadata {
        order_number: body.order_number,
        customer_name: body.customer_name,
        customer_email: body.customer_email,
        user_id,
        address: body.address,
        subtotal_amount: cart.sub_total_price(),
        total_amount: body.total.unwrap_or_else(|| cart.total_price()),
        discount_code: body.discount_code,
    };

    add_breadcrumb("checkout", "Checkout started", &[("order_number", &metadata.order_number)]);

    let url = state.checkout().create_session(&items, &metadata).await?;
    Ok(Json(CheckoutRedirect { url }))
}
