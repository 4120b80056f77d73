//! Checkout route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::Shopper;
use crate::services::cart::{CartService, CheckoutSummary};
use crate::state::AppState;

/// Subtotal, tax, shipping, and total for the current cart.
#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn summary(
    State(state): State<AppState>,
    Shopper(user_id): Shopper,
) -> Result<Json<CheckoutSummary>> {
    let summary = CartService::new(state.pool())
        .checkout_summary(user_id, &state.config().store)
        .await?;
    Ok(Json(summary))
}
