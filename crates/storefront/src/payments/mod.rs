//! Payment provider boundary.
//!
//! Checkout needs exactly two provider calls: look up an existing customer by
//! email, then create a hosted checkout session. [`PaymentProvider`] is the
//! seam; [`StripeClient`] is the production implementation and tests swap in
//! stubs through [`crate::state::AppState::from_parts`].

mod form;
mod stripe;

pub use form::encode_session_request;
pub use stripe::StripeClient;

use async_trait::async_trait;
use leureluxe_core::Email;
use leureluxe_core::checkout::CheckoutSessionRequest;
use serde::Deserialize;
use thiserror::Error;

/// Errors returned by a payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the request.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        kind: Option<String>,
        code: Option<String>,
    },

    /// The configured API base does not form a valid URL.
    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    /// The provider answered with a body we could not read.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A created checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted checkout page; absent when the provider could not produce one.
    #[serde(default)]
    pub url: Option<String>,
}

/// Operations checkout needs from a payment provider.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Id of the first customer registered with `email`, if any.
    async fn find_customer_by_email(&self, email: &Email) -> Result<Option<String>, PaymentError>;

    /// Create a hosted checkout session.
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError>;
}
