//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::StorefrontConfig;
use crate::services::payment::{PaymentError, PaymentGateway};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: SqlitePool,
    payment: Option<PaymentGateway>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The payment gateway client is only built when gateway keys are
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway HTTP client cannot be created.
    pub fn new(config: StorefrontConfig, pool: SqlitePool) -> Result<Self, PaymentError> {
        let payment = config.payment.as_ref().map(PaymentGateway::new).transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                payment,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Get the payment gateway client.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::NotConfigured` if no gateway keys are set.
    pub fn payment(&self) -> Result<&PaymentGateway, PaymentError> {
        self.inner.payment.as_ref().ok_or(PaymentError::NotConfigured)
    }
}
