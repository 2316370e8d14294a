//! Checkout session creation.
//!
//! Validates the cart, resolves the provider customer by email, builds the
//! discounted session request and submits it. Nothing is retried and nothing
//! is persisted; a failure at any step leaves no partial effects.

use std::sync::Arc;

use leureluxe_core::checkout::{
    self, CheckoutMetadata, CustomerSelection, SessionSettings, ValidationError,
    build_session_request,
};
use leureluxe_core::store::CartItem;
use thiserror::Error;
use tracing::instrument;

use crate::payments::{PaymentError, PaymentProvider};

/// Errors creating a checkout session.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart or metadata cannot be checked out.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The payment provider refused or could not be reached.
    #[error("Payment error: {0}")]
    Payment(#[source] PaymentError),

    /// The provider created a session without a hosted checkout URL.
    #[error("Checkout failed: no checkout URL returned for session {session_id}")]
    MissingRedirectUrl { session_id: String },

    /// Anything else.
    #[error("Checkout failed: {0}")]
    Unexpected(String),
}

impl From<PaymentError> for CheckoutError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Api { .. } | PaymentError::Http(_) => Self::Payment(err),
            PaymentError::Parse(_) | PaymentError::Endpoint(_) => Self::Unexpected(err.to_string()),
        }
    }
}

/// Creates hosted checkout sessions through a [`PaymentProvider`].
#[derive(Clone)]
pub struct CheckoutService {
    provider: Arc<dyn PaymentProvider>,
    settings: SessionSettings,
}

impl CheckoutService {
    #[must_use]
    pub fn new(provider: Arc<dyn PaymentProvider>, settings: SessionSettings) -> Self {
        Self { provider, settings }
    }

    /// Create a checkout session for `items` and return its redirect URL.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::Validation`] before any provider call
    /// - [`CheckoutError::Payment`] when the provider rejects a call
    /// - [`CheckoutError::MissingRedirectUrl`] when the session has no URL
    /// - [`CheckoutError::Unexpected`] for unreadable provider responses
    #[instrument(
        skip(self, items, metadata),
        fields(order_number = %metadata.order_number, items = items.len())
    )]
    pub async fn create_session(
        &self,
        items: &[CartItem],
        metadata: &CheckoutMetadata,
    ) -> Result<String, CheckoutError> {
        let email = checkout::validate(items, metadata).inspect_err(|e| {
            tracing::warn!(error = %e, "Checkout rejected");
        })?;

        let customer = match self
            .provider
            .find_customer_by_email(&email)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Customer lookup failed"))?
        {
            Some(id) => CustomerSelection::Existing(id),
            None => CustomerSelection::Email(email),
        };

        let request = build_session_request(items, metadata, customer, &self.settings)?;

        let session = self
            .provider
            .create_checkout_session(&request)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Checkout session creation failed"))?;

        match session.url.filter(|url| !url.is_empty()) {
            Some(url) => {
                tracing::info!(session_id = %session.id, "Checkout session ready");
                Ok(url)
            }
            None => {
                tracing::error!(session_id = %session.id, "Checkout session has no URL");
                Err(CheckoutError::MissingRedirectUrl {
                    session_id: session.id,
                })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use leureluxe_core::checkout::CheckoutSessionRequest;
    use leureluxe_core::image::ImageUrlBuilder;
    use leureluxe_core::{CurrencyCode, Email, Product, ProductId};
    use rust_decimal::Decimal;

    use super::*;
    use crate::payments::CheckoutSession;

    #[derive(Default)]
    struct RecordingProvider {
        customer: Option<String>,
        url: Option<String>,
        reject_with: Option<String>,
        calls: AtomicUsize,
        last_request: Mutex<Option<CheckoutSessionRequest>>,
    }

    #[async_trait]
    impl PaymentProvider for RecordingProvider {
        async fn find_customer_by_email(
            &self,
            _email: &Email,
        ) -> Result<Option<String>, PaymentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.customer.clone())
        }

        async fn create_checkout_session(
            &self,
            request: &CheckoutSessionRequest,
        ) -> Result<CheckoutSession, PaymentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            if let Some(message) = &self.reject_with {
                return Err(PaymentError::Api {
                    status: 400,
                    message: message.clone(),
                    kind: Some("invalid_request_error".to_string()),
                    code: None,
                });
            }
            Ok(CheckoutSession {
                id: "cs_test_1".to_string(),
                url: self.url.clone(),
            })
        }
    }

    fn service(provider: &Arc<RecordingProvider>) -> CheckoutService {
        let provider: Arc<dyn PaymentProvider> = provider.clone();
        CheckoutService::new(
            provider,
            SessionSettings {
                base_url: "https://shop.example.com".to_string(),
                currency: CurrencyCode::PHP,
                shipping_countries: vec!["PH".to_string()],
                images: ImageUrlBuilder::new("proj", "production"),
            },
        )
    }

    fn items() -> Vec<CartItem> {
        vec![CartItem {
            product: Product {
                id: ProductId::new("p1"),
                name: Some("Gold Hoops".to_string()),
                slug: Some("gold-hoops".to_string()),
                description: None,
                price: Some(Decimal::from(500)),
                images: Vec::new(),
                stock: None,
            },
            quantity: 2,
        }]
    }

    fn metadata() -> CheckoutMetadata {
        CheckoutMetadata {
            order_number: "ORD-100".to_string(),
            customer_name: "Ana Cruz".to_string(),
            customer_email: "ana@example.com".to_string(),
            user_id: None,
            address: None,
            subtotal_amount: Decimal::from(1000),
            total_amount: Decimal::from(900),
            discount_code: Some("TENOFF".to_string()),
        }
    }

    #[tokio::test]
    async fn test_returns_redirect_url() {
        let provider = Arc::new(RecordingProvider {
            url: Some("https://checkout.stripe.com/c/pay/cs_test_1".to_string()),
            ..Default::default()
        });

        let url = service(&provider)
            .create_session(&items(), &metadata())
            .await
            .unwrap();

        assert_eq!(url, "https://checkout.stripe.com/c/pay/cs_test_1");
        let request = provider.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.line_items[0].unit_amount, 45_000);
        assert_eq!(request.line_items[0].quantity, 2);
        assert_eq!(
            request.customer,
            CustomerSelection::Email(Email::parse("ana@example.com").unwrap())
        );
    }

    #[tokio::test]
    async fn test_reuses_existing_customer() {
        let provider = Arc::new(RecordingProvider {
            customer: Some("cus_42".to_string()),
            url: Some("https://checkout.stripe.com/x".to_string()),
            ..Default::default()
        });

        service(&provider)
            .create_session(&items(), &metadata())
            .await
            .unwrap();

        let request = provider.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(
            request.customer,
            CustomerSelection::Existing("cus_42".to_string())
        );
        assert!(request.update_customer_name);
    }

    #[tokio::test]
    async fn test_empty_cart_makes_no_provider_call() {
        let provider = Arc::new(RecordingProvider::default());

        let err = service(&provider)
            .create_session(&[], &metadata())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Validation(ValidationError::EmptyCart)
        ));
        assert_eq!(err.to_string(), "No items in cart");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_url_is_distinct_from_rejection() {
        let no_url = Arc::new(RecordingProvider::default());
        let missing = service(&no_url)
            .create_session(&items(), &metadata())
            .await
            .unwrap_err();
        assert!(matches!(
            missing,
            CheckoutError::MissingRedirectUrl { ref session_id } if session_id == "cs_test_1"
        ));

        let rejecting = Arc::new(RecordingProvider {
            reject_with: Some("Invalid currency: xyz".to_string()),
            ..Default::default()
        });
        let rejected = service(&rejecting)
            .create_session(&items(), &metadata())
            .await
            .unwrap_err();
        assert!(matches!(rejected, CheckoutError::Payment(_)));
        assert_eq!(rejected.to_string(), "Payment error: Invalid currency: xyz");
    }

    #[test]
    fn test_parse_failure_is_unexpected() {
        let parse = serde_json::from_str::<CheckoutSession>("not json").unwrap_err();
        let err = CheckoutError::from(PaymentError::Parse(parse));
        assert!(matches!(err, CheckoutError::Unexpected(_)));
        assert!(err.to_string().starts_with("Checkout failed: "));
    }
}
