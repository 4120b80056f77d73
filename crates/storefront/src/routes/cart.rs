//! Cart route handlers.
//!
//! All handlers act on the current shopper's cart; the shopper is created on
//! first use.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use giftshop_core::{CartItemId, ProductId};

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::Shopper;
use crate::models::{Cart, CartLine};
use crate::services::cart::{CartService, QuantityUpdate};
use crate::state::AppState;

/// Body of `POST /cart`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub product_id: Option<ProductId>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

const fn default_quantity() -> i64 {
    1
}

/// Body of `PUT /cart/{id}`.
#[derive(Debug, Deserialize)]
pub struct SetQuantity {
    pub quantity: Option<i64>,
}

/// The shopper's cart with totals.
#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn show(
    State(state): State<AppState>,
    Shopper(user_id): Shopper,
) -> Result<Json<Cart>> {
    Ok(Json(CartService::new(state.pool()).get_cart(user_id).await?))
}

/// Add a product to the cart. Returns the merged line.
#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn add(
    State(state): State<AppState>,
    Shopper(user_id): Shopper,
    ApiJson(body): ApiJson<AddToCart>,
) -> Result<(StatusCode, Json<CartLine>)> {
    let product_id = body
        .product_id
        .ok_or_else(|| AppError::Validation("Product ID is required".to_owned()))?;

    let line = CartService::new(state.pool())
        .add_to_cart(user_id, product_id, body.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(line)))
}

/// Change a line's quantity. Zero removes the line.
#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn update(
    State(state): State<AppState>,
    Shopper(user_id): Shopper,
    ApiPath(item_id): ApiPath<CartItemId>,
    ApiJson(body): ApiJson<SetQuantity>,
) -> Result<Response> {
    let quantity = body
        .quantity
        .ok_or_else(|| AppError::Validation("Invalid quantity".to_owned()))?;

    let update = CartService::new(state.pool())
        .update_quantity(user_id, item_id, quantity)
        .await?;

    Ok(match update {
        QuantityUpdate::Updated(line) => Json(line).into_response(),
        QuantityUpdate::Removed => {
            Json(json!({ "message": "Item removed from cart" })).into_response()
        }
    })
}

/// Remove one line.
#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn remove(
    State(state): State<AppState>,
    Shopper(user_id): Shopper,
    ApiPath(item_id): ApiPath<CartItemId>,
) -> Result<impl IntoResponse> {
    CartService::new(state.pool())
        .remove_from_cart(user_id, item_id)
        .await?;
    Ok(Json(json!({ "message": "Item removed from cart" })))
}

/// Empty the cart.
#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn clear(
    State(state): State<AppState>,
    Shopper(user_id): Shopper,
) -> Result<impl IntoResponse> {
    let removed = CartService::new(state.pool()).clear_cart(user_id).await?;
    Ok(Json(json!({ "message": "Cart cleared", "removed": removed })))
}
