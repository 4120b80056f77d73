//! Payment bridge endpoints.

use axum::http::StatusCode;
use serde_json::json;

use giftshop_integration_tests::{TestApp, gateway_signature};

#[tokio::test]
async fn test_verify_accepts_only_exact_signature() {
    let mut app = TestApp::spawn().await;
    let signature = gateway_signature("order_abc", "pay_123");

    let verified = app
        .put(
            "/payment",
            json!({ "orderId": "order_abc", "paymentId": "pay_123", "signature": signature }),
        )
        .await;
    assert_eq!(verified.status, StatusCode::OK);
    assert_eq!(verified.body, json!({ "verified": true }));

    let swapped = app
        .put(
            "/payment",
            json!({ "orderId": "pay_123", "paymentId": "order_abc", "signature": signature }),
        )
        .await;
    assert_eq!(swapped.status, StatusCode::BAD_REQUEST);
    assert_eq!(swapped.body, json!({ "verified": false }));

    let uppercase = app
        .put(
            "/payment",
            json!({
                "orderId": "order_abc",
                "paymentId": "pay_123",
                "signature": signature.to_uppercase(),
            }),
        )
        .await;
    assert_eq!(uppercase.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_verify_accepts_gateway_field_names() {
    let mut app = TestApp::spawn().await;

    let verified = app
        .put(
            "/payment",
            json!({
                "razorpay_order_id": "order_abc",
                "razorpay_payment_id": "pay_123",
                "razorpay_signature": gateway_signature("order_abc", "pay_123"),
            }),
        )
        .await;
    assert_eq!(verified.status, StatusCode::OK);
}

#[tokio::test]
async fn test_verify_rejects_incomplete_body() {
    let mut app = TestApp::spawn().await;

    let response = app.put("/payment", json!({ "orderId": "order_abc" })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(!response.error().is_empty());
}

#[tokio::test]
async fn test_create_rejects_bad_amounts() {
    let mut app = TestApp::spawn().await;

    let zero = app.post("/payment", json!({ "amount": 0 })).await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);

    let negative = app.post("/payment", json!({ "amount": -5 })).await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);

    let missing = app.post("/payment", json!({ "currency": "INR" })).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.error(), "Amount is required");
}
