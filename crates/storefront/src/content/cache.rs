//! Cache types for content API responses.

use std::sync::Arc;

use leureluxe_core::{Category, Product};

/// Cache key for catalog queries.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    ProductById(String),
    ProductBySlug(String),
    Categories,
    CategoryProducts(String),
}

/// Cached value types.
///
/// Lists are shared behind `Arc` so a cache hit does not copy the catalog.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Arc<Vec<Product>>),
    Categories(Arc<Vec<Category>>),
}
