//! Checkout and order administration.

use axum::http::StatusCode;
use serde_json::json;

use giftshop_integration_tests::{TestApp, checkout_body, gateway_signature};

#[tokio::test]
async fn test_place_order_round_trip() {
    let mut app = TestApp::spawn().await;
    let keychain = app.create_product("Moon Keychain", "150", "Keychains", 5).await;
    let earrings = app.create_product("Pearl Earrings", "99.99", "Earrings", 3).await;

    app.post("/cart", json!({ "productId": keychain.id, "quantity": 2 }))
        .await;
    app.post("/cart", json!({ "productId": earrings.id, "quantity": 1 }))
        .await;

    let order = app
        .post(
            "/orders",
            checkout_body(&[(&keychain, 2), (&earrings, 1)], "471.99"),
        )
        .await;
    assert_eq!(order.status, StatusCode::CREATED);
    assert_eq!(order.body["total"], json!(471.99));
    assert_eq!(order.body["status"], "pending");
    assert_eq!(order.body["paymentMethod"], "cod");
    assert_eq!(order.body["paymentStatus"], "pending");
    assert_eq!(order.body["customerName"], "Asha Rao");
    assert_eq!(order.body["shippingCountry"], "India");

    let items = order.body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    let keychain_line = items
        .iter()
        .find(|line| line["productId"] == json!(keychain.id))
        .unwrap();
    assert_eq!(keychain_line["quantity"], 2);
    assert_eq!(keychain_line["price"], json!(150.0));

    assert_eq!(app.stock_of(&keychain).await, 3);
    assert_eq!(app.stock_of(&earrings).await, 2);
    assert_eq!(app.get("/cart").await.body["count"], 0);

    let mine = app.get("/orders/mine").await;
    assert_eq!(mine.status, StatusCode::OK);
    assert_eq!(mine.body.as_array().unwrap().len(), 1);

    let id = order.body["id"].as_i64().unwrap();
    let detail = app.get(&format!("/orders/{id}")).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_order_changes_nothing() {
    let mut app = TestApp::spawn().await;
    let keychain = app.create_product("Moon Keychain", "150", "Keychains", 5).await;
    let earrings = app.create_product("Pearl Earrings", "99.99", "Earrings", 1).await;

    app.post("/cart", json!({ "productId": keychain.id, "quantity": 2 }))
        .await;

    // The second line asks for more earrings than exist.
    let response = app
        .post(
            "/orders",
            checkout_body(&[(&keychain, 2), (&earrings, 2)], "499.98"),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.error().starts_with("Not enough stock"));

    assert_eq!(app.stock_of(&keychain).await, 5);
    assert_eq!(app.stock_of(&earrings).await, 1);
    assert_eq!(app.get("/cart").await.body["count"], 2);
    assert_eq!(app.get("/orders/mine").await.body, json!([]));
}

#[tokio::test]
async fn test_missing_fields_are_rejected() {
    let mut app = TestApp::spawn().await;
    let keychain = app.create_product("Moon Keychain", "150", "Keychains", 5).await;

    let mut body = checkout_body(&[(&keychain, 1)], "150");
    body.as_object_mut().unwrap().remove("shippingAddress");
    let response = app.post("/orders", body).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error(), "Missing required fields");

    let empty = app.post("/orders", checkout_body(&[], "150")).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let unknown = app
        .post(
            "/orders",
            json!({
                "customerInfo": { "firstName": "Asha", "email": "asha@example.com" },
                "shippingAddress": { "address": "12 MG Road" },
                "items": [{ "productId": 9999, "quantity": 1, "price": 10 }],
                "total": 10,
            }),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(app.stock_of(&keychain).await, 5);
}

#[tokio::test]
async fn test_card_order_requires_valid_signature() {
    let mut app = TestApp::spawn().await;
    let keychain = app.create_product("Moon Keychain", "150", "Keychains", 5).await;

    let mut forged = checkout_body(&[(&keychain, 1)], "150");
    forged["paymentMethod"] = json!("card");
    forged["payment"] = json!({
        "orderId": "order_abc",
        "paymentId": "pay_123",
        "signature": "deadbeef",
    });
    let rejected = app.post("/orders", forged).await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
    assert_eq!(rejected.error(), "Payment verification failed");
    assert_eq!(app.stock_of(&keychain).await, 5);

    let mut paid = checkout_body(&[(&keychain, 1)], "150");
    paid["paymentMethod"] = json!("card");
    paid["payment"] = json!({
        "razorpay_order_id": "order_abc",
        "razorpay_payment_id": "pay_123",
        "razorpay_signature": gateway_signature("order_abc", "pay_123"),
    });
    let accepted = app.post("/orders", paid).await;
    assert_eq!(accepted.status, StatusCode::CREATED);
    assert_eq!(accepted.body["paymentStatus"], "paid");
    assert_eq!(accepted.body["paymentId"], "pay_123");
}

#[tokio::test]
async fn test_payment_proof_settles_one_order() {
    let mut app = TestApp::spawn().await;
    let keychain = app.create_product("Moon Keychain", "150", "Keychains", 5).await;

    let paid_body = || {
        let mut body = checkout_body(&[(&keychain, 1)], "150");
        body["paymentMethod"] = json!("card");
        body["payment"] = json!({
            "orderId": "order_abc",
            "paymentId": "pay_123",
            "signature": gateway_signature("order_abc", "pay_123"),
        });
        body
    };

    let first = app.post("/orders", paid_body()).await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(app.stock_of(&keychain).await, 4);

    let mut other = app.new_browser();
    let replayed = other.post("/orders", paid_body()).await;
    assert_eq!(replayed.status, StatusCode::BAD_REQUEST);
    assert_eq!(replayed.error(), "Payment already used");
    assert_eq!(app.stock_of(&keychain).await, 4);

    let again = app.post("/orders", paid_body()).await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.stock_of(&keychain).await, 4);
}

#[tokio::test]
async fn test_admin_updates_status() {
    let mut shopper = TestApp::spawn().await;
    let keychain = shopper
        .create_product("Moon Keychain", "150", "Keychains", 5)
        .await;
    let order = shopper
        .post("/orders", checkout_body(&[(&keychain, 1)], "150"))
        .await;
    let id = order.body["id"].as_i64().unwrap();

    let denied = shopper
        .put(&format!("/orders/{id}"), json!({ "status": "shipped" }))
        .await;
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);

    let mut admin = shopper.new_browser();
    admin.login_admin().await;

    let shipped = admin
        .put(&format!("/orders/{id}"), json!({ "status": "shipped" }))
        .await;
    assert_eq!(shipped.status, StatusCode::OK);
    assert_eq!(shipped.body["status"], "shipped");

    let invalid = admin
        .put(&format!("/orders/{id}"), json!({ "status": "lost" }))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

    let missing = admin
        .put("/orders/9999", json!({ "status": "shipped" }))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let detail = shopper.get(&format!("/orders/{id}")).await;
    assert_eq!(detail.body["status"], "shipped");
}

#[tokio::test]
async fn test_order_visibility() {
    let mut owner = TestApp::spawn().await;
    let keychain = owner.create_product("Moon Keychain", "150", "Keychains", 5).await;
    let order = owner
        .post("/orders", checkout_body(&[(&keychain, 1)], "150"))
        .await;
    let id = order.body["id"].as_i64().unwrap();

    let mut stranger = owner.new_browser();
    let hidden = stranger.get(&format!("/orders/{id}")).await;
    assert_eq!(hidden.status, StatusCode::FORBIDDEN);
    assert_eq!(stranger.get("/orders").await.status, StatusCode::UNAUTHORIZED);

    let mut admin = owner.new_browser();
    admin.login_admin().await;
    assert_eq!(admin.get(&format!("/orders/{id}")).await.status, StatusCode::OK);

    let all = admin.get("/orders").await;
    assert_eq!(all.status, StatusCode::OK);
    let orders = all.body.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["user"]["email"], "asha@example.com");
}
