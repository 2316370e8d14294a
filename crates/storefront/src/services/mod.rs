//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `store` - Session-backed cart and wishlist state per client
//! - `checkout` - Validation, customer lookup and hosted checkout sessions

pub mod checkout;
pub mod store;

pub use checkout::{CheckoutError, CheckoutService};
pub use store::{ClientStore, StoreError};
