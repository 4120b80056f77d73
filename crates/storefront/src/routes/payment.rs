//! Payment bridge route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{instrument, warn};

use giftshop_core::Money;

use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::services::orders::PaymentProof;
use crate::services::payment::PaymentIntent;
use crate::state::AppState;

/// Body of `POST /payment`. `amount` is in major units.
#[derive(Debug, Deserialize)]
pub struct CreatePayment {
    pub amount: Option<Money>,
    pub currency: Option<String>,
}

/// Create a gateway order for the browser checkout widget and return it with
/// the public key id.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreatePayment>,
) -> Result<Json<PaymentIntent>> {
    let amount = body
        .amount
        .ok_or_else(|| AppError::Validation("Amount is required".to_owned()))?;
    let currency = body
        .currency
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| state.config().store.currency.clone());

    let gateway = state.payment()?;
    let order = gateway.create_order(amount, &currency).await?;
    Ok(Json(gateway.intent(order)))
}

/// Check a payment signature. Responds 400 with `verified: false` on mismatch.
#[instrument(skip(state, proof), fields(order_id = %proof.order_id))]
pub async fn verify(
    State(state): State<AppState>,
    ApiJson(proof): ApiJson<PaymentProof>,
) -> Result<(StatusCode, Json<Value>)> {
    let verified = state
        .payment()?
        .verify(&proof.order_id, &proof.payment_id, &proof.signature);

    if verified {
        Ok((StatusCode::OK, Json(json!({ "verified": true }))))
    } else {
        warn!(payment_id = %proof.payment_id, "Payment signature mismatch");
        Ok((StatusCode::BAD_REQUEST, Json(json!({ "verified": false }))))
    }
}
