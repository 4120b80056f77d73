//! Integration test harness for the Giftshop storefront.
//!
//! Each [`TestApp`] owns a fresh in-memory SQLite database and drives the
//! real router with `tower::ServiceExt::oneshot`. The session cookie from
//! each response is replayed on the next request, so one `TestApp` behaves
//! like one browser.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p giftshop-integration-tests
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::sync::OnceLock;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use giftshop_core::Money;
use giftshop_storefront::config::{PaymentGatewayConfig, StoreSettings, StorefrontConfig};
use giftshop_storefront::db::products::NewProduct;
use giftshop_storefront::db::{self, ProductRepository};
use giftshop_storefront::middleware::session::SESSION_COOKIE_NAME;
use giftshop_storefront::models::Product;
use giftshop_storefront::routes;
use giftshop_storefront::services::auth::hash_password;
use giftshop_storefront::services::payment::payment_signature;
use giftshop_storefront::state::AppState;

/// Admin password accepted by every test app.
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

/// Gateway key secret used by every test app.
pub const PAYMENT_KEY_SECRET: &str = "kX9#mQ2$vL7@pR4!nW8^zT3&";

/// Argon2 hashing is slow in debug builds, so hash once per test binary.
fn admin_password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(ADMIN_PASSWORD).expect("hash admin password"))
}

fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("sqlite::memory:"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost".to_owned(),
        admin_password_hash: Some(SecretString::from(admin_password_hash())),
        store: StoreSettings::default(),
        payment: Some(PaymentGatewayConfig {
            key_id: "rzp_test_integration".to_owned(),
            key_secret: SecretString::from(PAYMENT_KEY_SECRET),
            // Nothing listens here; tests never reach the gateway.
            api_base: "http://127.0.0.1:9".to_owned(),
        }),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A response with its body parsed as JSON (`Value::Null` when empty or not
/// JSON).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `error` message of an error body.
    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

/// One browser talking to one storefront.
pub struct TestApp {
    router: Router,
    pub pool: SqlitePool,
    cookie: Option<String>,
}

impl TestApp {
    /// Start a storefront on a fresh, migrated in-memory database.
    pub async fn spawn() -> Self {
        let pool = db::connect_in_memory()
            .await
            .expect("connect to in-memory database");
        let state = AppState::new(test_config(), pool.clone()).expect("build app state");

        Self {
            router: routes::app(state),
            pool,
            cookie: None,
        }
    }

    /// A second browser against the same storefront, with no session.
    #[must_use]
    pub fn new_browser(&self) -> Self {
        Self {
            router: self.router.clone(),
            pool: self.pool.clone(),
            cookie: None,
        }
    }

    /// Send a request, optionally with a JSON body.
    pub async fn request(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        if let Some(cookie) = session_cookie(response.headers()) {
            self.cookie = Some(cookie);
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&mut self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// Log this browser in as admin.
    pub async fn login_admin(&mut self) {
        let response = self
            .post(
                "/admin/login",
                serde_json::json!({ "password": ADMIN_PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "admin login failed");
    }

    /// Insert a product directly.
    pub async fn create_product(&self, name: &str, price: &str, category: &str, stock: i64) -> Product {
        ProductRepository::new(&self.pool)
            .create(&NewProduct {
                name: name.to_owned(),
                description: Some(format!("A handmade {name}")),
                price: Money::parse(price).expect("valid price"),
                image: None,
                category: category.to_owned(),
                stock,
            })
            .await
            .expect("insert product")
    }

    /// Current stock of a product, read from the database.
    pub async fn stock_of(&self, product: &Product) -> i64 {
        ProductRepository::new(&self.pool)
            .get(product.id)
            .await
            .expect("query product")
            .expect("product exists")
            .stock
    }
}

/// Signature the gateway would send for this order and payment.
pub fn gateway_signature(order_id: &str, payment_id: &str) -> String {
    payment_signature(&SecretString::from(PAYMENT_KEY_SECRET), order_id, payment_id)
}

/// A valid cash-on-delivery checkout body for the given lines of
/// `(product, quantity)`.
pub fn checkout_body(lines: &[(&Product, i64)], total: &str) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|(product, quantity)| {
            serde_json::json!({
                "productId": product.id,
                "quantity": quantity,
                "price": product.price,
            })
        })
        .collect();

    serde_json::json!({
        "customerInfo": {
            "firstName": "Asha",
            "lastName": "Rao",
            "email": "asha@example.com",
            "phone": "9876543210",
        },
        "shippingAddress": {
            "address": "12 MG Road",
            "city": "Bengaluru",
            "state": "KA",
            "zipCode": "560001",
        },
        "items": items,
        "total": total,
    })
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .find(|pair| pair.starts_with(SESSION_COOKIE_NAME))
        .map(str::to_owned)
}
