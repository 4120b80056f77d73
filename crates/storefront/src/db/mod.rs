//! Database operations for the storefront SQLite database.
//!
//! ## Tables
//!
//! - `users` - Shoppers (guests are provisioned on first cart access)
//! - `products` - Catalog; source of truth for price and stock
//! - `categories` - Admin-curated category names for the product form
//! - `cart_items` - One row per (user, product)
//! - `orders` / `order_items` - Placed orders with price snapshots
//! - `tower_sessions` - Session storage (created by the session store)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p giftshop-cli -- migrate
//! ```
//!
//! # Transactions
//!
//! Read paths go through the repository structs, which borrow the pool.
//! Writes that must be atomic with other writes (order placement) are free
//! functions taking a `&mut SqliteConnection`, so the caller can run them on a
//! transaction.

pub mod cart;
pub mod categories;
pub mod orders;
pub mod products;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;
use tower_sessions_sqlx_store::SqliteStore;

pub use cart::CartRepository;
pub use categories::CategoryRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate category, referenced product).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique and foreign-key violations to [`RepositoryError::Conflict`].
    pub(crate) fn from_constraint(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
                return Self::Conflict(message.to_owned());
            }
        }
        Self::Database(err)
    }
}

/// Create a SQLite connection pool with sensible defaults.
///
/// The database file is created if missing and foreign keys are enforced.
/// In-memory URLs (`sqlite::memory:`) get a single long-lived connection,
/// since every SQLite connection would otherwise see its own empty database.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection cannot be
/// established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    let url = database_url.expose_secret();
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    if url.contains(":memory:") {
        return SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await;
    }

    SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Apply schema migrations and create the session table.
///
/// # Errors
///
/// Returns `RepositoryError::Migration` if a migration fails and
/// `RepositoryError::Database` if the session table cannot be created.
pub async fn migrate(pool: &SqlitePool) -> Result<(), RepositoryError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    SqliteStore::new(pool.clone()).migrate().await?;
    Ok(())
}

/// Connect to a fresh in-memory database with all migrations applied.
///
/// # Errors
///
/// Returns an error if the pool cannot be created or migrations fail.
pub async fn connect_in_memory() -> Result<SqlitePool, RepositoryError> {
    let pool = create_pool(&secrecy::SecretString::from("sqlite::memory:")).await?;
    migrate(&pool).await?;
    Ok(pool)
}
