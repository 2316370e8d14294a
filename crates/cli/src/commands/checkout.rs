//! Offline checkout preview.
//!
//! Reads an order file and prints the session request the storefront would
//! send to Stripe, without contacting Stripe or the CMS. Useful for checking
//! discount math before running a promotion.
//!
//! # Order file
//!
//! ```yaml
//! customer: cus_123          # optional; otherwise the email is used
//! metadata:
//!   orderNumber: ORD-1001
//!   customerName: Maria Santos
//!   customerEmail: maria@example.com
//!   subtotalAmount: 1000
//!   totalAmount: 900
//! items:
//!   - quantity: 2
//!     product:
//!       _id: prod-earrings
//!       name: Pearl Earrings
//!       price: 500
//! ```

use std::path::Path;

use leureluxe_core::checkout::{
    self, CheckoutMetadata, CheckoutSessionRequest, CustomerSelection, SessionSettings,
    ValidationError, build_session_request,
};
use leureluxe_core::store::CartItem;
use leureluxe_storefront::payments::encode_session_request;
use serde::Deserialize;
use thiserror::Error;

/// Errors producing a preview.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid order file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to render output: {0}")]
    Json(#[from] serde_json::Error),
}

/// An order as described in a preview file.
#[derive(Debug, Deserialize)]
pub struct OrderFile {
    /// Existing Stripe customer id to attach.
    #[serde(default)]
    pub customer: Option<String>,
    pub metadata: CheckoutMetadata,
    pub items: Vec<CartItem>,
}

/// Output format for the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PreviewFormat {
    /// The session request as JSON.
    Json,
    /// The form pairs posted to Stripe, one per line.
    Form,
}

/// Build the session request for an order file's contents.
///
/// # Errors
///
/// Returns an error if the YAML is malformed or the order fails checkout
/// validation.
pub fn preview(
    yaml: &str,
    settings: &SessionSettings,
) -> Result<CheckoutSessionRequest, PreviewError> {
    let order: OrderFile = serde_yaml::from_str(yaml)?;

    let email = checkout::validate(&order.items, &order.metadata)?;
    let customer = order
        .customer
        .filter(|id| !id.trim().is_empty())
        .map_or(CustomerSelection::Email(email), CustomerSelection::Existing);

    Ok(build_session_request(
        &order.items,
        &order.metadata,
        customer,
        settings,
    )?)
}

/// Render a request in the chosen format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(
    request: &CheckoutSessionRequest,
    format: PreviewFormat,
) -> Result<String, PreviewError> {
    match format {
        PreviewFormat::Json => Ok(serde_json::to_string_pretty(request)?),
        PreviewFormat::Form => Ok(encode_session_request(request)
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Read `path`, build the preview and print it.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the order is invalid.
pub async fn run(
    path: &Path,
    settings: &SessionSettings,
    format: PreviewFormat,
) -> Result<(), PreviewError> {
    let yaml = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| PreviewError::Read {
            path: path.display().to_string(),
            source,
        })?;

    let request = preview(&yaml, settings)?;
    tracing::info!(
        line_items = request.line_items.len(),
        discount = request.metadata.get("discountPercentage").map_or("0%", String::as_str),
        "Checkout preview built"
    );

    #[allow(clippy::print_stdout)]
    {
        println!("{}", render(&request, format)?);
    }
    Ok(())
}
