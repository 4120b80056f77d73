//! Session-related types.
//!
//! Types stored in the session for shopper identity and admin state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session-stored admin marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// When the admin logged in.
    pub logged_in_at: DateTime<Utc>,
}

/// Session keys.
pub mod keys {
    /// Key for the shopper's user id.
    pub const SHOPPER_ID: &str = "shopper_id";

    /// Key for the admin marker.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
