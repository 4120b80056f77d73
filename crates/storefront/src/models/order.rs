//! Order models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use giftshop_core::{
    Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, UserId,
};

use super::{Product, User};

/// A placed order. Customer and shipping fields are snapshots taken at
/// checkout; only `status` changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total: Money,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: String,
    pub shipping_city: Option<String>,
    pub shipping_state: Option<String>,
    pub shipping_zip: Option<String>,
    pub shipping_country: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order line joined with its product. `price` is the unit price at
/// checkout, not the product's current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    #[sqlx(rename = "item_id")]
    pub id: OrderItemId,
    pub order_id: OrderId,
    #[sqlx(rename = "item_product_id")]
    pub product_id: ProductId,
    pub quantity: i64,
    #[sqlx(rename = "unit_price")]
    pub price: Money,
    #[sqlx(flatten)]
    pub product: Product,
}

/// An order with its lines and, for admin views, the owning user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}
