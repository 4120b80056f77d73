//! Catalog product.

use chrono::{DateTime, Utc};
use serde::Serialize;

use giftshop_core::{Money, ProductId};

/// A product in the catalog.
///
/// `price` and `stock` are the live values; orders snapshot the price at
/// checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub image: Option<String>,
    pub category: String,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
