//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health               - Liveness check
//! GET    /health/ready         - Readiness check (database)
//!
//! # Catalog
//! GET    /products             - Product listing (?category=&search=)
//! GET    /products/{id}        - Product detail
//! POST   /products             - Create product (admin)
//! PUT    /products/{id}        - Update product (admin)
//! DELETE /products/{id}        - Delete product (admin)
//! GET    /categories           - Category list
//! POST   /categories           - Add category (admin)
//! DELETE /categories/{name}    - Remove category (admin)
//!
//! # Cart
//! GET    /cart                 - Current cart with totals
//! POST   /cart                 - Add item (merges with existing line)
//! DELETE /cart                 - Empty cart
//! PUT    /cart/{id}            - Set quantity (0 removes)
//! DELETE /cart/{id}            - Remove line
//!
//! # Checkout
//! GET    /checkout/summary     - Subtotal, tax, shipping, total
//! POST   /payment              - Create gateway order
//! PUT    /payment              - Verify gateway signature
//!
//! # Orders
//! GET    /orders               - All orders (admin)
//! GET    /orders/mine          - Current shopper's orders
//! GET    /orders/{id}          - Order detail (owner or admin)
//! POST   /orders               - Place order
//! PUT    /orders/{id}          - Update status (admin)
//!
//! # Admin session
//! POST   /admin/login          - Log in with the admin password
//! POST   /admin/logout         - Log out
//! GET    /admin/session        - `{authenticated}`
//! ```

pub mod admin;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod payment;
pub mod products;

use axum::{
    Router,
    extract::Request,
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{create_session_layer, request_id_middleware};
use crate::state::AppState;

/// Create the API routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route(
            "/categories",
            get(categories::index).post(categories::create),
        )
        .route("/categories/{name}", axum::routing::delete(categories::delete))
        .route(
            "/cart",
            get(cart::show).post(cart::add).delete(cart::clear),
        )
        .route(
            "/cart/{id}",
            axum::routing::put(cart::update).delete(cart::remove),
        )
        .route("/checkout/summary", get(checkout::summary))
        .route("/payment", post(payment::create).put(payment::verify))
        .route("/orders", get(orders::index).post(orders::create))
        .route("/orders/mine", get(orders::mine))
        .route(
            "/orders/{id}",
            get(orders::show).put(orders::update_status),
        )
        .route("/admin/login", post(admin::login))
        .route("/admin/logout", post(admin::logout))
        .route("/admin/session", get(admin::session_status))
}

/// Build the full application: health checks, API routes, sessions, request
/// ids, and request tracing.
///
/// Error tracking layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.pool(), state.config());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(routes())
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
