//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`,
//! and every error reaches the client as `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use giftshop_core::MoneyError;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::payment::PaymentError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Payment gateway operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Admin authentication failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Amount arithmetic failed.
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// Session store failure.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Missing or malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested quantity exceeds available stock.
    #[error("Stock error: {0}")]
    OutOfStock(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Admin login required.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource belongs to someone else.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_))
            | Self::Validation(_)
            | Self::OutOfStock(_)
            | Self::Money(_)
            | Self::Payment(PaymentError::InvalidAmount(_)) => StatusCode::BAD_REQUEST,
            Self::Auth(AuthError::InvalidCredentials) | Self::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Auth(AuthError::WeakPassword(_)) => StatusCode::BAD_REQUEST,
            Self::Auth(AuthError::NotConfigured) | Self::Payment(PaymentError::NotConfigured) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Database(_)
            | Self::Payment(_)
            | Self::Auth(_)
            | Self::Session(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Server errors get a generic message.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_owned(),
            Self::Database(RepositoryError::Conflict(msg))
            | Self::Validation(msg)
            | Self::OutOfStock(msg)
            | Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg) => msg.clone(),
            Self::Payment(PaymentError::InvalidAmount(msg)) => msg.clone(),
            Self::Auth(AuthError::InvalidCredentials) => "Invalid credentials".to_owned(),
            Self::Auth(AuthError::WeakPassword(msg)) => msg.clone(),
            Self::Auth(AuthError::NotConfigured) => "Admin login is not configured".to_owned(),
            Self::Money(e) => format!("Amount error: {e}"),
            Self::Payment(PaymentError::NotConfigured) => {
                "Payment gateway is not configured".to_owned()
            }
            Self::Payment(_) => "Payment gateway error".to_owned(),
            Self::Database(_) | Self::Auth(_) | Self::Session(_) | Self::Internal(_) => {
                "Internal server error".to_owned()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry. 503 means a feature is switched off
        // in configuration.
        if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::warn!(error = %self, "Feature not configured");
        } else if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a shopper ID.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Product not found".to_string());
        assert_eq!(err.to_string(), "Not found: Product not found");

        let err = AppError::OutOfStock("Only 2 left".to_string());
        assert_eq!(err.to_string(), "Stock error: Only 2 left");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(AppError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::OutOfStock("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Database(RepositoryError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database(RepositoryError::Conflict("dup".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Payment(PaymentError::NotConfigured).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Money(MoneyError::Overflow).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_body_is_json() {
        let (status, body) = body_of(AppError::Validation("Name is required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Name is required" }));
    }

    #[tokio::test]
    async fn test_unconfigured_admin_login_is_unavailable() {
        let (status, body) = body_of(AppError::Auth(AuthError::NotConfigured)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({ "error": "Admin login is not configured" }));
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let (status, body) = body_of(AppError::Internal("disk on fire at /var/db".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }
}
