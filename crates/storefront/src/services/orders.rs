//! Order service: checkout and order administration.
//!
//! Placing an order is a single transaction. Contact details, the order row,
//! its lines, the stock decrements, and the cart clear either all commit or
//! all roll back.

use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};

use giftshop_core::{
    Email, Money, OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, UserId,
};

use crate::config::StoreSettings;
use crate::db::cart::clear_for_user;
use crate::db::orders::{NewOrder, insert_line, insert_order};
use crate::db::products::{StockDecrement, decrement_stock};
use crate::db::users::record_contact;
use crate::db::{OrderRepository, RepositoryError};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{Order, OrderDetail};
use crate::services::payment::{PaymentError, PaymentGateway};

const MISSING_FIELDS: &str = "Missing required fields";

/// Customer contact details from the checkout form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Shipping address from the checkout form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

/// One requested order line. `price` is the unit price the shopper saw.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_id: ProductId,
    pub quantity: i64,
    pub price: Money,
}

/// Gateway payment proof for card orders.
///
/// Accepts both camelCase names and the gateway's own callback names.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProof {
    #[serde(alias = "razorpay_order_id")]
    pub order_id: String,
    #[serde(alias = "razorpay_payment_id")]
    pub payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub signature: String,
}

/// Checkout request body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub customer_info: Option<CustomerInfo>,
    pub shipping_address: Option<ShippingAddress>,
    pub items: Option<Vec<OrderItemInput>>,
    pub total: Option<Money>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub payment: Option<PaymentProof>,
}

/// Order operations.
pub struct OrderService<'a> {
    pool: &'a SqlitePool,
    settings: &'a StoreSettings,
    payment: Option<&'a PaymentGateway>,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    ///
    /// `payment` is required only for card orders.
    #[must_use]
    pub const fn new(
        pool: &'a SqlitePool,
        settings: &'a StoreSettings,
        payment: Option<&'a PaymentGateway>,
    ) -> Self {
        Self {
            pool,
            settings,
            payment,
        }
    }

    /// Turn a checkout request into a persisted order and empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for missing or malformed fields or a
    /// failed payment check, `AppError::NotFound` for an unknown product, and
    /// `AppError::OutOfStock` if a product has too few units. A payment id
    /// that already settled an order is rejected with a 400. Nothing is
    /// written when an error is returned.
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        request: PlaceOrderRequest,
    ) -> Result<OrderDetail> {
        let (order, email, items) = self.validate(user_id, request)?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        record_contact(&mut tx, user_id, &email, &order.customer_name).await?;
        let order_id = insert_order(&mut tx, &order).await?;

        for item in &items {
            match decrement_stock(&mut tx, item.product_id, item.quantity).await? {
                StockDecrement::Applied => {}
                StockDecrement::Missing => {
                    return Err(AppError::NotFound(format!(
                        "Product {} not found",
                        item.product_id
                    )));
                }
                StockDecrement::Insufficient { available } => {
                    warn!(product_id = %item.product_id, requested = item.quantity, available, "Insufficient stock at checkout");
                    return Err(AppError::OutOfStock(format!(
                        "Not enough stock for product {}: {available} available",
                        item.product_id
                    )));
                }
            }
            insert_line(&mut tx, order_id, item.product_id, item.quantity, item.price).await?;
        }

        clear_for_user(&mut tx, user_id).await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        let order_ref = order_id.to_string();
        add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_ref.as_str())]));
        info!(
            order_id = %order_id,
            total = %order.total,
            lines = items.len(),
            payment_method = %order.payment_method,
            "Order placed"
        );

        OrderRepository::new(self.pool)
            .get(order_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("order {order_id} missing after commit")))
    }

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderDetail>> {
        Ok(OrderRepository::new(self.pool).list_all().await?)
    }

    /// The shopper's own orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderDetail>> {
        Ok(OrderRepository::new(self.pool).list_for_user(user_id).await?)
    }

    /// One order, visible to its owner or an admin.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order does not exist and
    /// `AppError::Forbidden` if the viewer is neither owner nor admin.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(
        &self,
        id: OrderId,
        viewer: Option<UserId>,
        is_admin: bool,
    ) -> Result<OrderDetail> {
        let detail = OrderRepository::new(self.pool)
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

        if !is_admin && viewer != Some(detail.order.user_id) {
            return Err(AppError::Forbidden("Unauthorized".to_owned()));
        }
        Ok(detail)
    }

    /// Overwrite an order's status. Any status may follow any other.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an unknown status and
    /// `AppError::NotFound` if the order does not exist.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn update_order_status(&self, id: OrderId, status: &str) -> Result<Order> {
        let status: OrderStatus = status
            .parse()
            .map_err(|e: giftshop_core::ParseStatusError| AppError::Validation(e.to_string()))?;

        let order = OrderRepository::new(self.pool)
            .update_status(id, status)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

        info!(order_id = %id, status = %status, "Order status updated");
        Ok(order)
    }

    /// Check the request and build the order snapshot.
    fn validate(
        &self,
        user_id: UserId,
        request: PlaceOrderRequest,
    ) -> Result<(NewOrder, Email, Vec<OrderItemInput>)> {
        let (Some(customer), Some(shipping), Some(items), Some(total)) = (
            request.customer_info,
            request.shipping_address,
            request.items,
            request.total,
        ) else {
            return Err(AppError::Validation(MISSING_FIELDS.to_owned()));
        };

        if items.is_empty() || total.is_zero() {
            return Err(AppError::Validation(MISSING_FIELDS.to_owned()));
        }
        if items.iter().any(|item| item.quantity < 1) {
            return Err(AppError::Validation(
                "Item quantity must be at least 1".to_owned(),
            ));
        }

        let first_name = non_blank(customer.first_name)
            .ok_or_else(|| AppError::Validation("First name is required".to_owned()))?;
        let last_name = non_blank(customer.last_name);
        let email = non_blank(customer.email)
            .ok_or_else(|| AppError::Validation("Email is required".to_owned()))?;
        let email = Email::parse(&email)
            .map_err(|_| AppError::Validation("Invalid email address".to_owned()))?;
        let address = non_blank(shipping.address)
            .ok_or_else(|| AppError::Validation("Shipping address is required".to_owned()))?;

        let customer_name = match last_name {
            Some(last) => format!("{first_name} {last}"),
            None => first_name,
        };

        let (payment_status, payment_id) = match request.payment_method {
            PaymentMethod::Cod => (PaymentStatus::Pending, None),
            PaymentMethod::Card => {
                let proof = request.payment.ok_or_else(|| {
                    AppError::Validation("Payment details are required for card orders".to_owned())
                })?;
                let gateway = self.payment.ok_or(PaymentError::NotConfigured)?;
                if !gateway.verify(&proof.order_id, &proof.payment_id, &proof.signature) {
                    warn!(gateway_order_id = %proof.order_id, "Payment signature mismatch");
                    return Err(AppError::Validation(
                        "Payment verification failed".to_owned(),
                    ));
                }
                (PaymentStatus::Paid, Some(proof.payment_id))
            }
        };

        let order = NewOrder {
            user_id,
            total,
            customer_name,
            customer_email: email.as_str().to_owned(),
            customer_phone: non_blank(customer.phone),
            shipping_address: address,
            shipping_city: non_blank(shipping.city),
            shipping_state: non_blank(shipping.state),
            shipping_zip: non_blank(shipping.zip_code),
            shipping_country: non_blank(shipping.country)
                .unwrap_or_else(|| self.settings.default_country.clone()),
            payment_method: request.payment_method,
            payment_status,
            payment_id,
        };

        Ok((order, email, items))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}
