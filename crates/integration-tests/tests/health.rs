//! Health checks, admin session, and cross-cutting HTTP behavior.

use axum::http::{Method, StatusCode};
use serde_json::json;

use giftshop_integration_tests::TestApp;

#[tokio::test]
async fn test_health_endpoints() {
    let mut app = TestApp::spawn().await;

    let live = app.get("/health").await;
    assert_eq!(live.status, StatusCode::OK);

    let ready = app.get("/health/ready").await;
    assert_eq!(ready.status, StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let mut app = TestApp::spawn().await;

    let response = app.get("/products").await;
    assert!(response.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_malformed_json_gets_json_error() {
    let mut app = TestApp::spawn().await;

    let response = app
        .request(Method::POST, "/cart", Some(json!("not an object")))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(!response.error().is_empty());
}

#[tokio::test]
async fn test_admin_session_lifecycle() {
    let mut app = TestApp::spawn().await;

    let anonymous = app.get("/admin/session").await;
    assert_eq!(anonymous.body, json!({ "authenticated": false }));

    let wrong = app
        .post("/admin/login", json!({ "password": "not the password" }))
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.error(), "Invalid credentials");

    app.login_admin().await;
    assert_eq!(
        app.get("/admin/session").await.body,
        json!({ "authenticated": true })
    );

    let logout = app.post("/admin/logout", json!({})).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(
        app.get("/admin/session").await.body,
        json!({ "authenticated": false })
    );
    assert_eq!(app.get("/orders").await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_shopper_keeps_cart_across_admin_login() {
    let mut app = TestApp::spawn().await;
    let product = app.create_product("Moon Keychain", "150", "Keychains", 5).await;
    app.post("/cart", json!({ "productId": product.id, "quantity": 1 }))
        .await;

    app.login_admin().await;
    assert_eq!(app.get("/cart").await.body["count"], 1);
}
