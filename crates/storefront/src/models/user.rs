//! Shopper model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use giftshop_core::UserId;

/// A shopper.
///
/// Guests are created with no contact details; the first checkout records
/// the email and name given there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Option<String>,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}
