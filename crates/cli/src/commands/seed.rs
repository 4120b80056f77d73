//! Seed the catalog with sample products.
//!
//! Does nothing when the catalog already has products, so it is safe to run
//! on every deploy.

use giftshop_storefront::services::catalog::CatalogService;

use super::{CliError, connect};

/// Insert the sample catalog into an empty database.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    let inserted = CatalogService::new(&pool).seed_sample_products().await?;
    tracing::info!(inserted, "Seeding complete!");
    Ok(())
}
