//! Cart service.
//!
//! Stock is checked when items are added or changed, but not reserved. The
//! authoritative check happens when the order is placed.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, instrument};

use giftshop_core::{CartItemId, Money, ProductId, Totals, UserId};

use crate::config::StoreSettings;
use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{Cart, CartLine};

const NOT_ENOUGH_STOCK: &str = "Not enough stock available";

/// Result of a quantity change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityUpdate {
    /// The line now has the new quantity.
    Updated(CartLine),
    /// Quantity was zero, so the line was deleted.
    Removed,
}

/// Checkout totals for the current cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    #[serde(flatten)]
    pub totals: Totals,
    pub currency: String,
    /// Units in the cart.
    pub item_count: i64,
}

/// Cart operations for one shopper at a time.
pub struct CartService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// The shopper's cart with totals.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_cart(&self, user_id: UserId) -> Result<Cart> {
        let lines = CartRepository::new(self.pool).lines_for_user(user_id).await?;
        Ok(Cart::try_from(lines)?)
    }

    /// Add a product, merging with an existing line for the same product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if `quantity` is below 1,
    /// `AppError::NotFound` if the product does not exist, and
    /// `AppError::OutOfStock` if the cart would hold more than is in stock.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartLine> {
        if quantity < 1 {
            return Err(AppError::Validation(
                "Quantity must be at least 1".to_owned(),
            ));
        }

        let product = ProductRepository::new(self.pool)
            .get(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

        let cart = CartRepository::new(self.pool);
        let existing = cart.quantity_in_cart(user_id, product_id).await?;
        if existing.saturating_add(quantity) > product.stock {
            return Err(AppError::OutOfStock(NOT_ENOUGH_STOCK.to_owned()));
        }

        let item_id = cart.add(user_id, product_id, quantity).await?;
        let product_ref = product_id.to_string();
        add_breadcrumb(
            "cart",
            "Added to cart",
            Some(&[("product_id", product_ref.as_str())]),
        );
        info!(item_id = %item_id, quantity, "Added to cart");

        cart.get_line(item_id)
            .await?
            .ok_or_else(|| AppError::Internal("cart line vanished after insert".to_owned()))
    }

    /// Set a line's quantity; zero deletes the line.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a negative quantity,
    /// `AppError::NotFound` if the line does not exist, `AppError::Forbidden`
    /// if it belongs to another shopper, and `AppError::OutOfStock` if the
    /// quantity exceeds stock.
    #[instrument(skip(self), fields(user_id = %user_id, item_id = %item_id))]
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i64,
    ) -> Result<QuantityUpdate> {
        if quantity < 0 {
            return Err(AppError::Validation("Invalid quantity".to_owned()));
        }

        let cart = CartRepository::new(self.pool);
        let line = self.owned_line(&cart, user_id, item_id).await?;

        if quantity > line.product.stock {
            return Err(AppError::OutOfStock(NOT_ENOUGH_STOCK.to_owned()));
        }

        if quantity == 0 {
            cart.remove(item_id).await?;
            return Ok(QuantityUpdate::Removed);
        }

        cart.set_quantity(item_id, quantity).await?;
        Ok(QuantityUpdate::Updated(CartLine { quantity, ..line }))
    }

    /// Delete a line from the shopper's cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the line does not exist and
    /// `AppError::Forbidden` if it belongs to another shopper.
    #[instrument(skip(self), fields(user_id = %user_id, item_id = %item_id))]
    pub async fn remove_from_cart(&self, user_id: UserId, item_id: CartItemId) -> Result<()> {
        let cart = CartRepository::new(self.pool);
        self.owned_line(&cart, user_id, item_id).await?;
        cart.remove(item_id).await?;
        Ok(())
    }

    /// Empty the shopper's cart. Returns the number of lines removed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the delete fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn clear_cart(&self, user_id: UserId) -> Result<u64> {
        Ok(CartRepository::new(self.pool).clear(user_id).await?)
    }

    /// Subtotal, tax, shipping, and total for the shopper's cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    #[instrument(skip(self, settings), fields(user_id = %user_id))]
    pub async fn checkout_summary(
        &self,
        user_id: UserId,
        settings: &StoreSettings,
    ) -> Result<CheckoutSummary> {
        let cart = self.get_cart(user_id).await?;
        Ok(CheckoutSummary {
            totals: Totals::compute(cart.total, settings.tax_rate, Money::ZERO)?,
            currency: settings.currency.clone(),
            item_count: cart.count,
        })
    }

    async fn owned_line(
        &self,
        cart: &CartRepository<'_>,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<CartLine> {
        let line = cart
            .get_line(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart item not found".to_owned()))?;

        if line.user_id != user_id {
            return Err(AppError::Forbidden("Unauthorized".to_owned()));
        }
        Ok(line)
    }
}
