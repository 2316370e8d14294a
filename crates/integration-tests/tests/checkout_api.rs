//! Checkout API tests against the stub payment provider.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use leureluxe_core::Email;
use leureluxe_core::checkout::CustomerSelection;
use leureluxe_integration_tests::{StubOutcome, TestApp};
use serde_json::{Value, json};

fn order() -> Value {
    json!({
        "order_number": "ORD-1001",
        "customer_name": "Maria Santos",
        "customer_email": "maria@example.com",
    })
}

#[tokio::test]
async fn test_empty_cart_is_rejected_before_any_provider_call() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.post("/api/checkout", order()).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "No items in cart");
    assert_eq!(app.payments.calls(), 0);
}

#[tokio::test]
async fn test_invalid_email_is_rejected() {
    let app = TestApp::new();
    let mut client = app.client();
    client.add_to_cart("ring").await;

    let mut body = order();
    body["customer_email"] = json!("not-an-email");
    let response = client.post("/api/checkout", body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.payments.calls(), 0);
}

#[tokio::test]
async fn test_discounted_session_for_cart() {
    let app = TestApp::new();
    let mut client = app.client();
    client.add_to_cart("earrings").await;
    client.add_to_cart("earrings").await;

    let mut body = order();
    body["total"] = json!(900);
    let response = client.post("/api/checkout", body).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["url"],
        "https://checkout.stripe.com/c/pay/cs_test_stub"
    );

    assert_eq!(app.payments.lookups(), vec!["maria@example.com".to_string()]);
    let request = app.payments.last_request().unwrap();
    assert_eq!(request.line_items.len(), 1);
    assert_eq!(request.line_items[0].unit_amount, 45_000);
    assert_eq!(request.line_items[0].quantity, 2);
    assert_eq!(request.line_items[0].name, "Pearl Earrings");
    assert_eq!(request.metadata["subtotalAmount"], "1000");
    assert_eq!(request.metadata["totalAmount"], "900");
    assert_eq!(request.metadata["discountAmount"], "100");
    assert_eq!(request.metadata["discountPercentage"], "10%");
    assert_eq!(request.metadata["itemsCount"], "1");
    assert!(
        request
            .success_url
            .starts_with("http://localhost:3000/success?session_id={CHECKOUT_SESSION_ID}")
    );
    assert!(request.success_url.ends_with("orderNumber=ORD-1001"));
    assert_eq!(
        request.customer,
        CustomerSelection::Email(Email::parse("maria@example.com").unwrap())
    );
}

#[tokio::test]
async fn test_existing_customer_is_reused() {
    let app = TestApp::new();
    app.payments.set_existing_customer(Some("cus_existing"));
    let mut client = app.client();
    client.add_to_cart("necklace").await;

    let response = client.post("/api/checkout", order()).await;

    assert_eq!(response.status, StatusCode::OK);
    let request = app.payments.last_request().unwrap();
    assert_eq!(
        request.customer,
        CustomerSelection::Existing("cus_existing".to_string())
    );
    assert!(request.update_customer_name);
    assert_eq!(request.line_items[0].unit_amount, 125_000);
}

#[tokio::test]
async fn test_missing_redirect_url_is_distinct_from_rejection() {
    let app = TestApp::new();
    let mut client = app.client();
    client.add_to_cart("ring").await;

    app.payments.set_outcome(StubOutcome::NoUrl);
    let missing = client.post("/api/checkout", order()).await;
    assert_eq!(missing.status, StatusCode::BAD_GATEWAY);
    let error = missing.body["error"].as_str().unwrap();
    assert!(error.contains("no checkout URL"));

    app.payments
        .set_outcome(StubOutcome::Reject("Your card was declined".to_string()));
    let rejected = client.post("/api/checkout", order()).await;
    assert_eq!(rejected.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(
        rejected.body["error"],
        "Payment error: Your card was declined"
    );
}

#[tokio::test]
async fn test_unpriced_product_cannot_be_checked_out() {
    let app = TestApp::new();
    let mut client = app.client();
    client.add_to_cart("sample").await;

    let response = client.post("/api/checkout", order()).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.payments.last_request().is_none());
}

#[tokio::test]
async fn test_user_id_only_sent_for_signed_in_shoppers() {
    let app = TestApp::new();
    let mut client = app.client();
    client.add_to_cart("ring").await;

    client.post("/api/checkout", order()).await;
    let guest_request = app.payments.last_request().unwrap();
    assert!(!guest_request.metadata.contains_key("clerkUserId"));

    client
        .post("/api/session/sign-in", json!({ "user_id": "user_abc" }))
        .await;
    client.post("/api/checkout", order()).await;
    let user_request = app.payments.last_request().unwrap();
    assert_eq!(user_request.metadata["clerkUserId"], "user_abc");
}

#[tokio::test]
async fn test_checkout_leaves_cart_untouched() {
    let app = TestApp::new();
    let mut client = app.client();
    client.add_to_cart("ring").await;

    client.post("/api/checkout", order()).await;

    let cart = client.get("/api/cart").await;
    assert_eq!(cart.body["count"], 1);
}
