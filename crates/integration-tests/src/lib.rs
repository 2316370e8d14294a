//! Integration test harness for the Leure Luxe storefront.
//!
//! Tests drive the real router in-process with `tower::ServiceExt::oneshot`.
//! Sessions live in a `MemoryStore`, the catalog is an in-memory
//! [`Catalog`] and Stripe is replaced by [`StubPayments`], which records
//! every call. [`TestClient`] carries the session cookie between requests the
//! way a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p leureluxe-integration-tests
//!
//! # Including tests against a running storefront
//! STOREFRONT_BASE_URL=http://localhost:3000 cargo test -p leureluxe-integration-tests -- --ignored
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use leureluxe_core::checkout::{CheckoutSessionRequest, SessionSettings};
use leureluxe_core::image::ImageUrlBuilder;
use leureluxe_core::{Category, CategoryId, CurrencyCode, Email, ImageRef, Product, ProductId};
use leureluxe_storefront::content::{ContentError, ContentSource};
use leureluxe_storefront::middleware::{SESSION_COOKIE_NAME, session_layer};
use leureluxe_storefront::payments::{CheckoutSession, PaymentError, PaymentProvider};
use leureluxe_storefront::state::AppState;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

/// Base URL the test app believes it is served from.
pub const BASE_URL: &str = "http://localhost:3000";

// =============================================================================
// Catalog
// =============================================================================

/// In-memory catalog.
#[derive(Debug, Default)]
pub struct Catalog {
    products: Vec<Product>,
    categories: Vec<(Category, Vec<ProductId>)>,
    latency: Option<Duration>,
}

impl Catalog {
    /// A small jewelry catalog:
    ///
    /// | id         | slug          | price |
    /// |------------|---------------|-------|
    /// | `earrings` | pearl-earrings| 500   |
    /// | `necklace` | gold-necklace | 1250  |
    /// | `ring`     | silver-ring   | 199.99|
    /// | `sample`   | free-sample   | none  |
    #[must_use]
    pub fn jewelry() -> Self {
        let earrings = product("earrings", "Pearl Earrings", Some(Decimal::from(500)));
        let necklace = product("necklace", "Gold Necklace", Some(Decimal::from(1250)));
        let ring = product("ring", "Silver Ring", Some(Decimal::new(19999, 2)));
        let sample = product("sample", "Free Sample", None);

        let earrings_category = category("earrings", "Earrings");
        let necklaces_category = category("necklaces", "Necklaces");

        Self {
            categories: vec![
                (earrings_category, vec![earrings.id.clone()]),
                (necklaces_category, vec![necklace.id.clone()]),
            ],
            products: vec![earrings, necklace, ring, sample],
            latency: None,
        }
    }

    /// Delay every product lookup, like a round trip to the CMS.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

/// Build a catalog product with one image.
#[must_use]
pub fn product(id: &str, name: &str, price: Option<Decimal>) -> Product {
    Product {
        id: ProductId::new(id),
        name: Some(name.to_string()),
        slug: Some(name.to_lowercase().replace(' ', "-")),
        description: Some(format!("{name} from the Leure Luxe atelier")),
        price,
        images: vec![ImageRef::new(format!("image-{id}-800x800-jpg"))],
        stock: Some(5),
    }
}

fn category(slug: &str, title: &str) -> Category {
    Category {
        id: CategoryId::new(format!("category-{slug}")),
        title: Some(title.to_string()),
        slug: Some(slug.to_string()),
        description: None,
        product_count: None,
    }
}

#[async_trait]
impl ContentSource for Catalog {
    async fn products(&self) -> Result<Vec<Product>, ContentError> {
        let mut products = self.products.clone();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn product_by_id(&self, id: &ProductId) -> Result<Option<Product>, ContentError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(self.products.iter().find(|p| &p.id == id).cloned())
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, ContentError> {
        Ok(self
            .products
            .iter()
            .find(|p| p.slug.as_deref() == Some(slug))
            .cloned())
    }

    async fn categories(&self) -> Result<Vec<Category>, ContentError> {
        Ok(self
            .categories
            .iter()
            .map(|(category, members)| Category {
                product_count: u32::try_from(members.len()).ok(),
                ..category.clone()
            })
            .collect())
    }

    async fn products_in_category(&self, slug: &str) -> Result<Vec<Product>, ContentError> {
        let Some((_, members)) = self
            .categories
            .iter()
            .find(|(category, _)| category.slug.as_deref() == Some(slug))
        else {
            return Ok(Vec::new());
        };
        Ok(self
            .products
            .iter()
            .filter(|p| members.contains(&p.id))
            .cloned()
            .collect())
    }
}

// =============================================================================
// Payments
// =============================================================================

/// How the stub answers `create_checkout_session`.
#[derive(Debug, Clone)]
pub enum StubOutcome {
    /// A session with this hosted URL.
    Url(String),
    /// A session without a URL.
    NoUrl,
    /// A provider rejection carrying this message.
    Reject(String),
}

/// Payment provider stub that records every call.
#[derive(Debug)]
pub struct StubPayments {
    outcome: Mutex<StubOutcome>,
    existing_customer: Mutex<Option<String>>,
    calls: AtomicUsize,
    lookups: Mutex<Vec<String>>,
    requests: Mutex<Vec<CheckoutSessionRequest>>,
}

impl Default for StubPayments {
    fn default() -> Self {
        Self {
            outcome: Mutex::new(StubOutcome::Url(
                "https://checkout.stripe.com/c/pay/cs_test_stub".to_string(),
            )),
            existing_customer: Mutex::new(None),
            calls: AtomicUsize::new(0),
            lookups: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl StubPayments {
    pub fn set_outcome(&self, outcome: StubOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    /// Make customer lookups return `id`.
    pub fn set_existing_customer(&self, id: Option<&str>) {
        *self.existing_customer.lock().unwrap() = id.map(String::from);
    }

    /// Total provider calls, lookups included.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Emails looked up so far.
    #[must_use]
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    /// The most recent session request.
    #[must_use]
    pub fn last_request(&self) -> Option<CheckoutSessionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PaymentProvider for StubPayments {
    async fn find_customer_by_email(&self, email: &Email) -> Result<Option<String>, PaymentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.lookups.lock().unwrap().push(email.to_string());
        Ok(self.existing_customer.lock().unwrap().clone())
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let outcome = self.outcome.lock().unwrap().clone();
        match outcome {
            StubOutcome::Url(url) => Ok(CheckoutSession {
                id: "cs_test_stub".to_string(),
                url: Some(url),
            }),
            StubOutcome::NoUrl => Ok(CheckoutSession {
                id: "cs_test_stub".to_string(),
                url: None,
            }),
            StubOutcome::Reject(message) => Err(PaymentError::Api {
                status: 400,
                message,
                kind: Some("invalid_request_error".to_string()),
                code: None,
            }),
        }
    }
}

// =============================================================================
// Application
// =============================================================================

/// The storefront router wired to in-memory dependencies.
pub struct TestApp {
    pub router: Router,
    pub payments: Arc<StubPayments>,
}

impl TestApp {
    /// Build the app with the [`Catalog::jewelry`] catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::with_catalog(Catalog::jewelry())
    }

    /// Build the app with a custom catalog.
    ///
    /// The database pool is lazy and points at a closed port, so handlers
    /// that touch it (readiness) see it as unavailable.
    #[must_use]
    pub fn with_catalog(catalog: Catalog) -> Self {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(250))
            .connect_lazy("postgres://leureluxe@127.0.0.1:1/leureluxe_test")
            .unwrap();

        let payments = Arc::new(StubPayments::default());
        let provider: Arc<dyn PaymentProvider> = payments.clone();

        let state = AppState::from_parts(
            pool,
            Arc::new(catalog),
            provider,
            SessionSettings {
                base_url: BASE_URL.to_string(),
                currency: CurrencyCode::PHP,
                shipping_countries: vec!["PH".to_string()],
                images: ImageUrlBuilder::new("testproj", "production"),
            },
        );

        let router = leureluxe_storefront::app(
            state,
            session_layer(MemoryStore::default(), BASE_URL),
        );

        Self { router, payments }
    }

    /// A new browser with an empty cookie jar.
    #[must_use]
    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookie: None,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Response status and JSON body (`Value::Null` for non-JSON bodies).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// One browser: sends requests and keeps the session cookie.
///
/// Clones share the cookie held at the time of cloning, like tabs of the
/// same browser.
#[derive(Clone)]
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
}

impl TestClient {
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn post_empty(&mut self, uri: &str) -> TestResponse {
        self.send(Method::POST, uri, None).await
    }

    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None).await
    }

    /// Add a product to the cart, asserting success.
    pub async fn add_to_cart(&mut self, product_id: &str) -> TestResponse {
        let response = self
            .post("/api/cart/items", serde_json::json!({ "product_id": product_id }))
            .await;
        assert_eq!(response.status, StatusCode::OK, "add_to_cart: {:?}", response.body);
        response
    }

    /// Current session cookie value, once the server has set one.
    #[must_use]
    pub fn session_cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(cookie) = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(';').next())
            .find(|pair| pair.starts_with(&format!("{SESSION_COOKIE_NAME}=")))
        {
            self.cookie = Some(cookie.to_string());
        }

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Parse a decimal from a JSON string field such as `"1000"` or `"199.99"`.
#[must_use]
pub fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .map_or_else(|| value.to_string(), String::from)
        .parse()
        .unwrap()
}
