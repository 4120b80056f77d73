//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::SqlitePool;
use thiserror::Error;

use giftshop_storefront::db::{self, RepositoryError};
use giftshop_storefront::error::AppError;
use giftshop_storefront::services::auth::AuthError;

const DEFAULT_DATABASE_URL: &str = "sqlite://giftshop.db";

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),

    /// Migration or query failure.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Service-level failure.
    #[error("{0}")]
    App(#[from] AppError),

    /// Password hashing or validation failure.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Reading from stdin failed.
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

/// Open the storefront database named by `GIFTSHOP_DATABASE_URL` (or
/// `DATABASE_URL`), creating the file if needed.
pub async fn connect() -> Result<SqlitePool, CliError> {
    dotenvy::dotenv().ok();

    let url = std::env::var("GIFTSHOP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned());

    tracing::info!("Connecting to storefront database...");
    Ok(db::create_pool(&SecretString::from(url)).await?)
}
