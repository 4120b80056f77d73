//! Session middleware configuration.
//!
//! Sessions live in the `tower_sessions` table of the storefront database.
//! They hold the shopper's user id and, after admin login, the admin marker.

use sqlx::SqlitePool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "gs_session";

/// Session expiry time in seconds (30 days of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Create the session layer backed by SQLite.
///
/// The session table is created by [`crate::db::migrate`]. The cookie is
/// marked `Secure` when the storefront is served over HTTPS.
#[must_use]
pub fn create_session_layer(
    pool: &SqlitePool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<SqliteStore> {
    let store = SqliteStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
