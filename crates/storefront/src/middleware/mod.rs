//! HTTP middleware and extractors for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with SQLite store)
//!
//! # Extractors
//!
//! - [`Shopper`] - the current shopper, created as a guest on first use
//! - [`RequireAdmin`] / [`OptionalAdmin`] - admin session checks

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{
    ExistingShopper, OptionalAdmin, RequireAdmin, Shopper, clear_current_admin, set_current_admin,
};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
