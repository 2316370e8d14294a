//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                              - Liveness check
//! GET    /health/ready                        - Readiness check (database)
//!
//! # Catalog
//! GET    /api/products                        - All products
//! GET    /api/products/{slug}                 - Product by slug
//! GET    /api/categories                      - Categories with product counts
//! GET    /api/categories/{slug}/products      - Products in a category
//!
//! # Cart
//! GET    /api/cart                            - Items, count, subtotal, total
//! POST   /api/cart/items                      - Add one unit ({product_id})
//! DELETE /api/cart/items/{product_id}         - Remove a line
//! GET    /api/cart/items/{product_id}/count   - Quantity of a product
//! DELETE /api/cart                            - Empty the cart
//!
//! # Wishlist
//! GET    /api/wishlist                        - Wishlist items
//! POST   /api/wishlist/items                  - Add ({product_id})
//! DELETE /api/wishlist/items/{product_id}     - Remove
//! GET    /api/wishlist/items/{product_id}     - Whether a product is wishlisted
//! DELETE /api/wishlist                        - Empty the wishlist
//!
//! # Identity
//! GET    /api/session                         - Active user
//! POST   /api/session/sign-in                 - Authenticate ({user_id}), migrating guest data
//! POST   /api/session/sign-out                - Continue as a new guest
//!
//! # Checkout
//! POST   /api/checkout                        - Create a Stripe checkout session
//! ```

pub mod cart;
pub mod checkout;
pub mod health;
pub mod products;
pub mod session;
pub mod wishlist;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{slug}", get(products::show))
        .route("/categories", get(products::categories))
        .route("/categories/{slug}/products", get(products::category_products))
        .route("/cart", get(cart::show).delete(cart::clear))
        .route("/cart/items", post(cart::add))
        .route("/cart/items/{product_id}", delete(cart::remove))
        .route("/cart/items/{product_id}/count", get(cart::item_count))
        .route("/wishlist", get(wishlist::show).delete(wishlist::clear))
        .route("/wishlist/items", post(wishlist::add))
        .route(
            "/wishlist/items/{product_id}",
            get(wishlist::contains).delete(wishlist::remove),
        )
        .route("/session", get(session::show))
        .route("/session/sign-in", post(session::sign_in))
        .route("/session/sign-out", post(session::sign_out))
        .route("/checkout", post(checkout::create))
}

/// Create the full application router (health checks plus `/api`).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
}
