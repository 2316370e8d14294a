//! Catalog documents as the content backend delivers them.
//!
//! Only the shape matters here: the store and the checkout builder consume
//! plain products, whatever query produced them. Field names follow the CMS
//! documents (`_id`, `_ref`) so responses deserialize without mapping.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};

/// A sellable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price in the store currency's standard unit.
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default)]
    pub stock: Option<u32>,
}

impl Product {
    /// Price used for totals, treating a missing price as zero.
    #[must_use]
    pub fn price_or_zero(&self) -> Decimal {
        self.price.unwrap_or(Decimal::ZERO)
    }

    /// Price usable for a payment line: present and strictly positive.
    #[must_use]
    pub fn chargeable_price(&self) -> Option<Decimal> {
        self.price.filter(|price| price.is_sign_positive() && !price.is_zero())
    }
}

/// An image field pointing at an uploaded asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub asset: AssetRef,
}

/// Reference to an asset document, e.g. `image-Tb9Ew8CX-2000x3000-jpg`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    #[serde(rename = "_ref")]
    pub reference: String,
}

impl ImageRef {
    /// Build an image reference from an asset id.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            asset: AssetRef {
                reference: reference.into(),
            },
        }
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Number of products referencing this category, when the query counts them.
    #[serde(default, rename = "productCount", skip_serializing_if = "Option::is_none")]
    pub product_count: Option<u32>,
}
