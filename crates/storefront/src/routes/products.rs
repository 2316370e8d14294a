//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use leureluxe_core::image::ImageUrlBuilder;
use leureluxe_core::{Category, Product};
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Product with its image references resolved to CDN URLs.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub image_urls: Vec<String>,
}

impl ProductView {
    #[must_use]
    pub fn new(product: Product, images: &ImageUrlBuilder) -> Self {
        let image_urls = product
            .images
            .iter()
            .filter_map(|image| images.url_for(image))
            .collect();
        Self {
            product,
            image_urls,
        }
    }

    /// Resolve a list of products.
    #[must_use]
    pub fn list(
        products: impl IntoIterator<Item = Product>,
        images: &ImageUrlBuilder,
    ) -> Vec<Self> {
        products
            .into_iter()
            .map(|product| Self::new(product, images))
            .collect()
    }
}

/// All products.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<ProductView>>> {
    let products = state.content().products().await?;
    Ok(Json(ProductView::list(products, state.images())))
}

/// A product by slug.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductView>> {
    let product = state
        .content()
        .product_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;
    Ok(Json(ProductView::new(product, state.images())))
}

/// All categories with product counts.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.content().categories().await?))
}

/// Products in a category.
#[instrument(skip(state))]
pub async fn category_products(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<ProductView>>> {
    let products = state.content().products_in_category(&slug).await?;
    Ok(Json(ProductView::list(products, state.images())))
}
