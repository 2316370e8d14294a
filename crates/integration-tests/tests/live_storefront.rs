//! Smoke tests against a running storefront.
//!
//! Requires the server (and its database) to be up:
//!
//! ```bash
//! cargo run -p leureluxe-storefront &
//! STOREFRONT_BASE_URL=http://localhost:3000 \
//!   cargo test -p leureluxe-integration-tests --test live_storefront -- --ignored
//! ```

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::Value;

fn base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().cookie_store(true).build().unwrap()
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_live_readiness() {
    let response = client()
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_live_session_cookie_keeps_guest() {
    let client = client();
    let url = format!("{}/api/session", base_url());

    let first: Value = client
        .get(&url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let second: Value = client
        .get(&url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(first["is_guest"], true);
    assert_eq!(first["user_id"], second["user_id"]);
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_live_empty_cart_checkout_is_rejected() {
    let response = client()
        .post(format!("{}/api/checkout", base_url()))
        .json(&serde_json::json!({
            "order_number": "ORD-LIVE",
            "customer_name": "Live Test",
            "customer_email": "live@example.com",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No items in cart");
}
