//! Leure Luxe Core - Shared domain library.
//!
//! This crate provides the domain pieces used across all Leure Luxe components:
//! - `storefront` - Public-facing e-commerce API
//! - `cli` - Command-line tools for migrations and checkout previews
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. The storefront decides where state is persisted and
//! which payment provider receives the checkout request.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, money, products and addresses
//! - [`image`] - CMS image reference to CDN URL resolution
//! - [`store`] - Per-user cart and wishlist state with guest migration
//! - [`checkout`] - Checkout validation, discount math and session request assembly

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod image;
pub mod store;
pub mod types;

pub use types::*;
