//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! gs-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `GIFTSHOP_DATABASE_URL` - SQLite connection string (falls back to
//!   `DATABASE_URL`, then `sqlite://giftshop.db`)
//!
//! Migrations live in `crates/storefront/migrations/`. The session table is
//! created alongside them.

use giftshop_storefront::db;

use super::{CliError, connect};

/// Apply storefront migrations.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    db::migrate(&pool).await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
