//! Checkout validation, discount math and session request assembly.
//!
//! The pipeline is linear and has no persisted intermediate state:
//!
//! 1. [`validate`] rejects unusable input before any network call.
//! 2. The caller resolves an existing provider customer by email.
//! 3. [`Discount::from_totals`] derives the ratio that reconciles the cart
//!    subtotal with the discounted total.
//! 4. [`build_session_request`] spreads that ratio across every line and
//!    assembles the provider request.
//!
//! Submitting the request belongs to the storefront's payment client.

mod session;

pub use session::{
    CHECKOUT_SESSION_PLACEHOLDER, CheckoutSessionRequest, CustomerSelection, LineItem,
    SessionMode, SessionSettings, build_session_request,
};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::CartItem;
use crate::types::{Address, Email, EmailError, ProductId, UserId};

/// Order-level data that accompanies the cart into checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutMetadata {
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    /// Authenticated user placing the order; absent for guest checkout.
    /// Sent to the payment provider as `clerkUserId`.
    #[serde(default, alias = "clerkUserId")]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub address: Option<Address>,
    /// Cart value before discounts, in standard currency units.
    pub subtotal_amount: Decimal,
    /// Amount to charge after discounts. Never above the subtotal.
    pub total_amount: Decimal,
    #[serde(default)]
    pub discount_code: Option<String>,
}

/// Input problems detected before contacting the payment provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No items in cart")]
    EmptyCart,

    #[error("Customer email is required")]
    MissingCustomerEmail,

    #[error("Customer email is invalid: {0}")]
    InvalidCustomerEmail(#[source] EmailError),

    #[error("Order number is required")]
    MissingOrderNumber,

    #[error("Product {product_id} has no price")]
    UnusablePrice { product_id: ProductId },

    #[error("Product {product_id} has an invalid quantity")]
    InvalidQuantity { product_id: ProductId },

    #[error("{field} cannot be negative")]
    NegativeAmount { field: &'static str },

    #[error("totalAmount ({total}) cannot exceed subtotalAmount ({subtotal})")]
    TotalExceedsSubtotal { total: Decimal, subtotal: Decimal },
}

/// Check items and metadata, returning the parsed customer email.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found: empty cart, missing or
/// malformed email, missing order number, negative amounts, a total above
/// the subtotal, or a line whose product has no positive price, whose
/// quantity is zero or whose line total overflows.
pub fn validate(
    items: &[CartItem],
    metadata: &CheckoutMetadata,
) -> Result<Email, ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::EmptyCart);
    }

    let email = match Email::parse(&metadata.customer_email) {
        Ok(email) => email,
        Err(EmailError::Empty) => return Err(ValidationError::MissingCustomerEmail),
        Err(e) => return Err(ValidationError::InvalidCustomerEmail(e)),
    };

    if metadata.order_number.trim().is_empty() {
        return Err(ValidationError::MissingOrderNumber);
    }

    if metadata.subtotal_amount.is_sign_negative() && !metadata.subtotal_amount.is_zero() {
        return Err(ValidationError::NegativeAmount {
            field: "subtotalAmount",
        });
    }
    if metadata.total_amount.is_sign_negative() && !metadata.total_amount.is_zero() {
        return Err(ValidationError::NegativeAmount {
            field: "totalAmount",
        });
    }
    if metadata.total_amount > metadata.subtotal_amount {
        return Err(ValidationError::TotalExceedsSubtotal {
            total: metadata.total_amount,
            subtotal: metadata.subtotal_amount,
        });
    }

    for item in items {
        if item.quantity == 0 {
            return Err(ValidationError::InvalidQuantity {
                product_id: item.product.id.clone(),
            });
        }
        if item.product.chargeable_price().is_none() {
            return Err(ValidationError::UnusablePrice {
                product_id: item.product.id.clone(),
            });
        }
    }

    // Line totals and their sum must be representable
    items
        .iter()
        .try_fold(Decimal::ZERO, |sum, item| {
            item.checked_line_total()
                .and_then(|line| sum.checked_add(line))
                .ok_or_else(|| ValidationError::UnusablePrice {
                    product_id: item.product.id.clone(),
                })
        })?;

    Ok(email)
}

/// Discount applied uniformly across every line of a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discount {
    /// `subtotal - total`.
    pub amount: Decimal,
    /// `amount / subtotal`, or zero when the subtotal is zero.
    pub ratio: Decimal,
}

impl Discount {
    /// Derive the discount that turns `subtotal` into `total`.
    ///
    /// A zero subtotal yields a zero ratio instead of a division error.
    #[must_use]
    pub fn from_totals(subtotal: Decimal, total: Decimal) -> Self {
        let amount = subtotal - total;
        let ratio = if subtotal.is_zero() {
            Decimal::ZERO
        } else {
            amount.checked_div(subtotal).unwrap_or(Decimal::ZERO)
        };
        Self { amount, ratio }
    }

    /// Unit price after the discount, in standard currency units.
    #[must_use]
    pub fn apply(&self, price: Decimal) -> Decimal {
        price * (Decimal::ONE - self.ratio)
    }

    /// Ratio as a whole percentage label, e.g. `"10%"`.
    #[must_use]
    pub fn percentage_label(&self) -> String {
        let percent = (self.ratio * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        format!("{}%", percent.normalize())
    }
}
