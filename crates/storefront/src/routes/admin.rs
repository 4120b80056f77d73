//! Admin session route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::extract::ApiJson;
use crate::middleware::{OptionalAdmin, clear_current_admin, set_current_admin};
use crate::services::auth::{AuthError, verify_admin};
use crate::state::AppState;

/// Body of `POST /admin/login`.
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

/// Verify the admin password and mark the session as admin.
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<Value>> {
    if let Err(e) = verify_admin(
        state.config().admin_password_hash.as_ref(),
        &body.password,
    ) {
        if matches!(e, AuthError::InvalidCredentials) {
            warn!("Failed admin login");
        }
        return Err(e.into());
    }

    set_current_admin(&session).await?;
    info!("Admin logged in");
    Ok(Json(json!({ "authenticated": true })))
}

/// Drop the admin marker. The shopper's cart is untouched.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<Value>> {
    clear_current_admin(&session).await?;
    Ok(Json(json!({ "authenticated": false })))
}

/// Whether the session is an admin session.
pub async fn session_status(OptionalAdmin(admin): OptionalAdmin) -> Json<Value> {
    Json(json!({ "authenticated": admin.is_some() }))
}
