//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `GIFTSHOP_DATABASE_URL` - SQLite connection string (falls back to
//!   `DATABASE_URL`, then `sqlite://giftshop.db`)
//! - `GIFTSHOP_HOST` - Bind address (default: 127.0.0.1)
//! - `GIFTSHOP_PORT` - Listen port (default: 3000)
//! - `GIFTSHOP_BASE_URL` - Public URL (default: <http://localhost:3000>)
//! - `GIFTSHOP_ADMIN_PASSWORD_HASH` - Argon2 PHC hash of the admin password
//!   (generate with `gs-cli admin hash-password`); admin login is disabled
//!   when unset
//! - `GIFTSHOP_TAX_RATE` - Tax rate applied at checkout (default: 0.18)
//! - `GIFTSHOP_CURRENCY` - ISO 4217 store currency (default: INR)
//! - `GIFTSHOP_DEFAULT_COUNTRY` - Shipping country when omitted (default: India)
//! - `PAYMENT_KEY_ID` / `PAYMENT_KEY_SECRET` - Payment gateway API keys; the
//!   online payment path is disabled unless both are set
//! - `PAYMENT_API_BASE` - Gateway REST base URL (default: <https://api.razorpay.com/v1>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://giftshop.db";
const DEFAULT_PAYMENT_API_BASE: &str = "https://api.razorpay.com/v1";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// SQLite connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Argon2 PHC hash of the admin password
    pub admin_password_hash: Option<SecretString>,
    /// Checkout settings
    pub store: StoreSettings,
    /// Payment gateway credentials
    pub payment: Option<PaymentGatewayConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Pricing and shipping defaults applied at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// Tax rate applied to the cart subtotal (0.18 = 18%)
    pub tax_rate: Decimal,
    /// ISO 4217 currency code used for gateway payments
    pub currency: String,
    /// Country recorded on orders whose shipping address omits one
    pub default_country: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(18, 2),
            currency: "INR".to_owned(),
            default_country: "India".to_owned(),
        }
    }
}

/// Payment gateway API configuration.
///
/// Implements `Debug` manually to redact the key secret.
#[derive(Clone)]
pub struct PaymentGatewayConfig {
    /// Public key id (also handed to the browser checkout widget)
    pub key_id: String,
    /// Key secret; signs payment callbacks
    pub key_secret: SecretString,
    /// REST API base URL
    pub api_base: String,
}

impl std::fmt::Debug for PaymentGatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentGatewayConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed or the payment key
    /// secret fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("GIFTSHOP_DATABASE_URL");
        let host = parse_env("GIFTSHOP_HOST", "127.0.0.1")?;
        let port = parse_env("GIFTSHOP_PORT", "3000")?;
        let base_url = get_env_or_default("GIFTSHOP_BASE_URL", "http://localhost:3000");
        let admin_password_hash =
            get_optional_env("GIFTSHOP_ADMIN_PASSWORD_HASH").map(SecretString::from);

        let store = StoreSettings::from_env()?;
        let payment = PaymentGatewayConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            admin_password_hash,
            store,
            payment,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must be marked `Secure` (HTTPS deployment).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl StoreSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let tax_rate = match get_optional_env("GIFTSHOP_TAX_RATE") {
            Some(raw) => parse_tax_rate(&raw)?,
            None => defaults.tax_rate,
        };

        Ok(Self {
            tax_rate,
            currency: get_optional_env("GIFTSHOP_CURRENCY").unwrap_or(defaults.currency),
            default_country: get_optional_env("GIFTSHOP_DEFAULT_COUNTRY")
                .unwrap_or(defaults.default_country),
        })
    }
}

impl PaymentGatewayConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let (Some(key_id), Some(key_secret)) = (
            get_optional_env("PAYMENT_KEY_ID"),
            get_optional_env("PAYMENT_KEY_SECRET"),
        ) else {
            return Ok(None);
        };

        validate_secret_strength(&key_secret, "PAYMENT_KEY_SECRET")?;

        Ok(Some(Self {
            key_id,
            key_secret: SecretString::from(key_secret),
            api_base: get_env_or_default("PAYMENT_API_BASE", DEFAULT_PAYMENT_API_BASE),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL` (what sqlx tooling reads).
fn get_database_url(primary_key: &str) -> SecretString {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_or_else(
            |_| SecretString::from(DEFAULT_DATABASE_URL),
            SecretString::from,
        )
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a tax rate in `[0, 1)`.
fn parse_tax_rate(raw: &str) -> Result<Decimal, ConfigError> {
    let rate: Decimal = raw
        .trim()
        .parse()
        .map_err(|_| invalid_tax_rate(raw, "not a decimal number"))?;
    if rate.is_sign_negative() || rate >= Decimal::ONE {
        return Err(invalid_tax_rate(raw, "must be between 0 and 1"));
    }
    Ok(rate)
}

fn invalid_tax_rate(raw: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidEnvVar("GIFTSHOP_TAX_RATE".to_string(), format!("{raw}: {reason}"))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
