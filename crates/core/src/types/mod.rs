//! Core types for Leure Luxe.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod email;
pub mod id;
pub mod money;
pub mod product;

pub use address::Address;
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{CurrencyCode, to_minor_units};
pub use product::{AssetRef, Category, ImageRef, Product};
