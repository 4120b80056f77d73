//! Identity extractors.
//!
//! Every shopper gets a user row the first time a handler asks for one; its
//! id is kept in the session. Admin access is a separate marker in the same
//! session, set by `POST /admin/login`.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use tower_sessions::Session;
use tracing::debug;

use giftshop_core::UserId;

use crate::db::UserRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

fn session_from(parts: &Parts) -> Result<Session, AppError> {
    parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or_else(|| AppError::Internal("session layer is not installed".to_owned()))
}

/// The current shopper.
///
/// Creates a guest user and stores its id in the session when the session
/// has none, or when the stored user no longer exists.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Shopper(user_id): Shopper) -> impl IntoResponse {
///     format!("cart for {user_id}")
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shopper(pub UserId);

impl FromRequestParts<AppState> for Shopper {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = session_from(parts)?;
        let users = UserRepository::new(state.pool());

        if let Some(user_id) = session.get::<UserId>(session_keys::SHOPPER_ID).await? {
            if users.get_by_id(user_id).await?.is_some() {
                set_sentry_user(&user_id);
                return Ok(Self(user_id));
            }
        }

        let guest = users.create_guest().await?;
        session.insert(session_keys::SHOPPER_ID, guest.id).await?;
        set_sentry_user(&guest.id);
        debug!(user_id = %guest.id, "Created guest shopper");

        Ok(Self(guest.id))
    }
}

/// The shopper id stored in the session, without creating one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistingShopper(pub Option<UserId>);

impl<S> FromRequestParts<S> for ExistingShopper
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = session_from(parts)?;
        Ok(Self(session.get::<UserId>(session_keys::SHOPPER_ID).await?))
    }
}

/// Extractor that requires an admin session.
///
/// Rejects with 401 when the session has no admin marker.
pub struct RequireAdmin(pub CurrentAdmin);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = session_from(parts)?;
        session
            .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
            .await?
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Admin login required".to_owned()))
    }
}

/// Extractor that reports whether the request carries an admin session.
pub struct OptionalAdmin(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdmin
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(admin))
    }
}

/// Mark the session as admin. The session id is rotated first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(
            session_keys::CURRENT_ADMIN,
            CurrentAdmin {
                logged_in_at: Utc::now(),
            },
        )
        .await
}

/// Remove the admin marker from the session (logout). The shopper identity
/// is kept.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    Ok(())
}
