//! Money and checkout arithmetic using decimal math.
//!
//! All amounts are in the store currency's major unit (rupees, not paise).
//! Amounts are never negative; prices, line totals, and order totals all go
//! through [`Money`].

use core::fmt;
use core::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of minor units (paise, cents) per major unit.
const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Errors produced when constructing a [`Money`] value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is below zero.
    #[error("amount cannot be negative")]
    Negative,
    /// The input is not a decimal number.
    #[error("invalid amount: {0}")]
    Invalid(String),
    /// The result does not fit in a decimal.
    #[error("amount is too large")]
    Overflow,
}

/// A non-negative monetary amount.
///
/// Serializes as a JSON number and accepts either a number or a numeric
/// string on input, so `149.99` and `"149.99"` are equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// Zero in the store currency.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a money value from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        Ok(Self(amount.normalize()))
    }

    /// Parse a money value from text such as `"149.99"`.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Invalid`] if the text is not a decimal number
    /// and [`MoneyError::Negative`] if it is below zero.
    pub fn parse(s: &str) -> Result<Self, MoneyError> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| MoneyError::Invalid(s.to_owned()))?;
        Self::new(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiply by a quantity (line total). Negative quantities count as zero.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the product does not fit.
    pub fn times(self, quantity: i64) -> Result<Self, MoneyError> {
        self.0
            .checked_mul(Decimal::from(quantity.max(0)))
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    /// Add two amounts.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the sum does not fit.
    pub fn checked_add(self, rhs: Self) -> Result<Self, MoneyError> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }

    /// Sum a sequence of amounts.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the sum does not fit.
    pub fn try_sum<I>(amounts: I) -> Result<Self, MoneyError>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, Self::checked_add)
    }

    /// Round to two decimal places, halves away from zero.
    #[must_use]
    pub fn round_cents(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Convert to minor units (e.g. paise) for a payment gateway.
    ///
    /// Returns `None` if the amount does not fit in an `i64`.
    #[must_use]
    pub fn to_minor_units(self) -> Option<i64> {
        self.0
            .checked_mul(Decimal::from(MINOR_UNITS_PER_MAJOR))?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

/// Checkout totals for a cart.
///
/// `total = subtotal + tax + shipping`, with tax rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Sum of line totals.
    pub subtotal: Money,
    /// Tax on the subtotal.
    pub tax: Money,
    /// Shipping charge.
    pub shipping: Money,
    /// Amount payable.
    pub total: Money,
    /// Tax rate applied (0.18 = 18%).
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_rate: Decimal,
}

impl Totals {
    /// Compute totals for a subtotal at the given tax rate.
    ///
    /// A negative tax rate is treated as zero.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the tax or total does not fit.
    pub fn compute(subtotal: Money, tax_rate: Decimal, shipping: Money) -> Result<Self, MoneyError> {
        let rate = tax_rate.max(Decimal::ZERO);
        let tax = subtotal
            .0
            .checked_mul(rate)
            .map(Money)
            .ok_or(MoneyError::Overflow)?
            .round_cents();
        let total = subtotal.checked_add(tax)?.checked_add(shipping)?.round_cents();

        Ok(Self {
            subtotal,
            tax,
            shipping,
            total,
            tax_rate: rate,
        })
    }
}

#[cfg(feature = "sqlite")]
impl sqlx::Type<sqlx::Sqlite> for Money {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <String as sqlx::Type<sqlx::Sqlite>>::type_info()
    }

    fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
    }
}

#[cfg(feature = "sqlite")]
impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for Money {
    fn decode(
        value: <sqlx::Sqlite as sqlx::Database>::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "sqlite")]
impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Sqlite as sqlx::Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<'q, sqlx::Sqlite>>::encode(self.0.to_string(), buf)
    }
}
