//! Category route handlers.
//!
//! Every write returns the full, ordered category list.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAdmin;
use crate::services::catalog::CatalogService;
use crate::state::AppState;

/// Body of `POST /categories`.
#[derive(Debug, Deserialize)]
pub struct NewCategory {
    pub name: Option<String>,
}

/// List category names in display order.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(
        CatalogService::new(state.pool()).list_categories().await?,
    ))
}

/// Add a category (admin).
#[instrument(skip(state, _admin))]
pub async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ApiJson(body): ApiJson<NewCategory>,
) -> Result<impl IntoResponse> {
    let name = body.name.unwrap_or_default();
    let categories = CatalogService::new(state.pool())
        .add_category(&name)
        .await?;
    Ok((StatusCode::CREATED, Json(categories)))
}

/// Remove a category (admin). Products keep their category text.
#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ApiPath(name): ApiPath<String>,
) -> Result<Json<Vec<String>>> {
    Ok(Json(
        CatalogService::new(state.pool())
            .delete_category(&name)
            .await?,
    ))
}
