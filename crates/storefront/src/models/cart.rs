//! Cart models.

use serde::Serialize;

use giftshop_core::{CartItemId, Money, MoneyError, ProductId, UserId};

use super::Product;

/// A cart line joined with its product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[sqlx(rename = "item_id")]
    pub id: CartItemId,
    pub user_id: UserId,
    #[sqlx(rename = "item_product_id")]
    pub product_id: ProductId,
    pub quantity: i64,
    #[sqlx(flatten)]
    pub product: Product,
}

impl CartLine {
    /// Current price times quantity.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the total does not fit.
    pub fn line_total(&self) -> Result<Money, MoneyError> {
        self.product.price.times(self.quantity)
    }
}

/// A shopper's cart with computed totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cart {
    pub items: Vec<CartLine>,
    /// Sum of price times quantity over all lines.
    pub total: Money,
    /// Sum of quantities over all lines.
    pub count: i64,
}

impl TryFrom<Vec<CartLine>> for Cart {
    type Error = MoneyError;

    fn try_from(items: Vec<CartLine>) -> Result<Self, Self::Error> {
        let line_totals = items
            .iter()
            .map(CartLine::line_total)
            .collect::<Result<Vec<_>, _>>()?;
        let total = Money::try_sum(line_totals)?;
        let count = items
            .iter()
            .fold(0_i64, |count, line| count.saturating_add(line.quantity));
        Ok(Self {
            items,
            total,
            count,
        })
    }
}
