//! Application state shared across handlers.

use std::sync::Arc;

use leureluxe_core::checkout::SessionSettings;
use leureluxe_core::image::ImageUrlBuilder;
use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::content::{ContentSource, SanityClient};
use crate::middleware::ClientLocks;
use crate::payments::{PaymentError, PaymentProvider, StripeClient};
use crate::services::CheckoutService;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Content and payments are trait objects so
/// tests can run the full router against in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: PgPool,
    content: Arc<dyn ContentSource>,
    checkout: CheckoutService,
    images: ImageUrlBuilder,
    client_locks: ClientLocks,
}

impl AppState {
    /// Create the production state: Sanity content and Stripe payments.
    ///
    /// # Errors
    ///
    /// Returns an error if the Stripe HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig, pool: PgPool) -> Result<Self, PaymentError> {
        let content: Arc<dyn ContentSource> = Arc::new(SanityClient::new(&config.sanity));
        let payments: Arc<dyn PaymentProvider> = Arc::new(StripeClient::new(&config.stripe)?);

        let settings = SessionSettings {
            base_url: config.base_url.clone(),
            currency: config.checkout.currency,
            shipping_countries: config.checkout.shipping_countries.clone(),
            images: ImageUrlBuilder::new(&config.sanity.project_id, &config.sanity.dataset),
        };

        Ok(Self::from_parts(pool, content, payments, settings))
    }

    /// Assemble state from explicit parts.
    #[must_use]
    pub fn from_parts(
        pool: PgPool,
        content: Arc<dyn ContentSource>,
        payments: Arc<dyn PaymentProvider>,
        settings: SessionSettings,
    ) -> Self {
        let images = settings.images.clone();
        Self {
            inner: Arc::new(AppStateInner {
                pool,
                content,
                checkout: CheckoutService::new(payments, settings),
                images,
                client_locks: ClientLocks::new(),
            }),
        }
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the catalog content source.
    #[must_use]
    pub fn content(&self) -> &dyn ContentSource {
        self.inner.content.as_ref()
    }

    /// Get the checkout service.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }

    /// Get the image URL builder for the catalog dataset.
    #[must_use]
    pub fn images(&self) -> &ImageUrlBuilder {
        &self.inner.images
    }

    /// Get the per-client request locks.
    #[must_use]
    pub fn client_locks(&self) -> &ClientLocks {
        &self.inner.client_locks
    }
}
