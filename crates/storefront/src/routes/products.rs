//! Product route handlers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::instrument;

use giftshop_core::ProductId;

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::RequireAdmin;
use crate::models::Product;
use crate::services::catalog::{CatalogService, ProductInput, ProductQuery};
use crate::state::AppState;

/// List products, optionally filtered by `category` and `search`.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = CatalogService::new(state.pool()).list_products(query).await?;
    Ok(Json(products))
}

/// Show one product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(CatalogService::new(state.pool()).get_product(id).await?))
}

/// Create a product (admin).
#[instrument(skip(state, _admin, input))]
pub async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<impl IntoResponse> {
    let product = CatalogService::new(state.pool()).create_product(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product (admin). Absent fields keep their current values.
#[instrument(skip(state, _admin, input))]
pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<Product>> {
    Ok(Json(
        CatalogService::new(state.pool())
            .update_product(id, input)
            .await?,
    ))
}

/// Delete a product (admin).
#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<impl IntoResponse> {
    CatalogService::new(state.pool()).delete_product(id).await?;
    Ok(Json(json!({ "message": "Product deleted" })))
}
