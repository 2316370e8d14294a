//! Read-only catalog content.
//!
//! Products and categories are authored in Sanity and fetched with GROQ
//! queries. The storefront never writes content. [`ContentSource`] is the seam
//! handlers depend on; [`SanityClient`] is the production implementation.

mod cache;
mod sanity;

pub use sanity::SanityClient;

use async_trait::async_trait;
use leureluxe_core::{Category, Product, ProductId};
use thiserror::Error;

/// Errors that can occur when reading catalog content.
#[derive(Debug, Error)]
pub enum ContentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The content API returned a non-success status.
    #[error("Content API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured project does not form a valid URL.
    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// Catalog queries the storefront needs.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Every product, ordered by name.
    async fn products(&self) -> Result<Vec<Product>, ContentError>;

    /// A product by document id.
    async fn product_by_id(&self, id: &ProductId) -> Result<Option<Product>, ContentError>;

    /// A product by URL slug.
    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, ContentError>;

    /// Every category with its product count.
    async fn categories(&self) -> Result<Vec<Category>, ContentError>;

    /// Products that reference the category with `slug`.
    async fn products_in_category(&self, slug: &str) -> Result<Vec<Product>, ContentError>;
}
