//! Order route handlers.
//!
//! Shoppers place orders and read their own; listing every order and
//! changing a status require an admin session.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use giftshop_core::OrderId;

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{ExistingShopper, OptionalAdmin, RequireAdmin, Shopper};
use crate::models::{Order, OrderDetail};
use crate::services::orders::{OrderService, PlaceOrderRequest};
use crate::state::AppState;

/// Body of `PUT /orders/{id}`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
}

fn service(state: &AppState) -> OrderService<'_> {
    OrderService::new(
        state.pool(),
        &state.config().store,
        state.payment().ok(),
    )
}

/// Every order, newest first (admin).
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<OrderDetail>>> {
    Ok(Json(service(&state).list_orders().await?))
}

/// The current shopper's orders, newest first.
#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn mine(
    State(state): State<AppState>,
    Shopper(user_id): Shopper,
) -> Result<Json<Vec<OrderDetail>>> {
    Ok(Json(service(&state).list_orders_for_user(user_id).await?))
}

/// One order, for its owner or an admin.
#[instrument(skip(state, viewer, admin))]
pub async fn show(
    State(state): State<AppState>,
    ExistingShopper(viewer): ExistingShopper,
    OptionalAdmin(admin): OptionalAdmin,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<OrderDetail>> {
    let detail = service(&state)
        .get_order(id, viewer, admin.is_some())
        .await?;
    Ok(Json(detail))
}

/// Place an order from the checkout form.
#[instrument(skip(state, request), fields(user_id = %user_id))]
pub async fn create(
    State(state): State<AppState>,
    Shopper(user_id): Shopper,
    ApiJson(request): ApiJson<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderDetail>)> {
    let detail = service(&state).place_order(user_id, request).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Overwrite an order's status (admin).
#[instrument(skip(state, _admin))]
pub async fn update_status(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> Result<Json<Order>> {
    let status = body
        .status
        .ok_or_else(|| AppError::Validation("Status is required".to_owned()))?;
    Ok(Json(service(&state).update_order_status(id, &status).await?))
}
