//! Payment gateway bridge.
//!
//! Creates gateway orders over the gateway's REST API and verifies the
//! signature the gateway hands back to the browser after a card payment.
//! The signature is `hex(HMAC-SHA256(key_secret, "{order_id}|{payment_id}"))`.

use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, error, instrument};

use giftshop_core::Money;

use crate::config::PaymentGatewayConfig;

/// Errors from the payment bridge.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The gateway keys are not configured.
    #[error("payment gateway is not configured")]
    NotConfigured,

    /// Amount is zero or cannot be expressed in minor units.
    #[error("invalid payment amount: {0}")]
    InvalidAmount(String),

    /// HTTP client could not be built.
    #[error("http client error: {0}")]
    Client(String),

    /// Request to the gateway failed.
    #[error("gateway request failed: {0}")]
    Request(String),

    /// Gateway answered with an error status.
    #[error("gateway returned {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Gateway response could not be parsed.
    #[error("invalid gateway response: {0}")]
    Response(String),
}

/// An order created on the gateway. `amount` is in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayOrder {
    #[serde(rename(deserialize = "id"))]
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
}

/// Response of `POST /payment`: the gateway order plus the public key id the
/// browser widget needs to open checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    #[serde(flatten)]
    pub order: GatewayOrder,
    pub key_id: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: String,
}

/// Payment gateway client.
#[derive(Clone)]
pub struct PaymentGateway {
    client: Client,
    key_id: String,
    key_secret: SecretString,
    api_base: String,
}

impl std::fmt::Debug for PaymentGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentGateway")
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl PaymentGateway {
    /// Create a gateway client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Client` if the HTTP client cannot be built.
    pub fn new(config: &PaymentGatewayConfig) -> Result<Self, PaymentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PaymentError::Client(e.to_string()))?;

        Ok(Self {
            client,
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            api_base: config.api_base.trim_end_matches('/').to_owned(),
        })
    }

    /// Public key id, shared with the browser checkout widget.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Create a gateway order for `amount` (major units) in `currency`.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidAmount` for a zero amount and a request,
    /// API, or response error if the gateway call fails.
    #[instrument(skip(self), fields(amount = %amount, currency = %currency))]
    pub async fn create_order(
        &self,
        amount: Money,
        currency: &str,
    ) -> Result<GatewayOrder, PaymentError> {
        let minor = to_minor_units(amount)?;
        let request = CreateOrderRequest {
            amount: minor,
            currency,
            receipt: format!("receipt_{}", Utc::now().timestamp_millis()),
        };

        let response = self
            .client
            .post(format!("{}/orders", self.api_base))
            .basic_auth(&self.key_id, Some(self.key_secret.expose_secret()))
            .json(&request)
            .send()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "Gateway rejected order creation");
            return Err(PaymentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let order: GatewayOrder = response
            .json()
            .await
            .map_err(|e| PaymentError::Response(e.to_string()))?;

        debug!(order_id = %order.order_id, "Gateway order created");
        Ok(order)
    }

    /// Pair a created gateway order with the public key id.
    #[must_use]
    pub fn intent(&self, order: GatewayOrder) -> PaymentIntent {
        PaymentIntent {
            order,
            key_id: self.key_id().to_owned(),
        }
    }

    /// Check a payment signature returned by the gateway.
    #[must_use]
    pub fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        verify_signature(&self.key_secret, order_id, payment_id, signature)
    }
}

/// Convert a major-unit amount to minor units (×100, half away from zero).
///
/// # Errors
///
/// Returns `PaymentError::InvalidAmount` for zero or out-of-range amounts.
pub fn to_minor_units(amount: Money) -> Result<i64, PaymentError> {
    if amount.is_zero() {
        return Err(PaymentError::InvalidAmount(
            "amount must be greater than zero".to_owned(),
        ));
    }
    amount
        .to_minor_units()
        .filter(|minor| *minor > 0)
        .ok_or_else(|| PaymentError::InvalidAmount(format!("{amount} is out of range")))
}

/// Compute the expected signature for a gateway order and payment.
#[must_use]
pub fn payment_signature(secret: &SecretString, order_id: &str, payment_id: &str) -> String {
    // HMAC accepts keys of any length
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes()) else {
        return String::new();
    };
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Whether `signature` is the hex HMAC-SHA256 of `"{order_id}|{payment_id}"`.
#[must_use]
pub fn verify_signature(
    secret: &SecretString,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    let expected = payment_signature(secret, order_id, payment_id);
    !expected.is_empty() && constant_time_compare(&expected, signature)
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("S")
    }

    #[test]
    fn test_signature_is_hex_hmac_of_joined_ids() {
        let mut mac = Hmac::<Sha256>::new_from_slice(b"S").unwrap();
        mac.update(b"O1|P1");
        let expected = hex::encode(mac.finalize().into_bytes());

        assert_eq!(payment_signature(&secret(), "O1", "P1"), expected);
        assert!(verify_signature(&secret(), "O1", "P1", &expected));
    }

    #[test]
    fn test_any_altered_byte_fails() {
        let good = payment_signature(&secret(), "O1", "P1");
        for i in 0..good.len() {
            let mut bytes = good.clone().into_bytes();
            bytes[i] = if bytes[i] == b'0' { b'1' } else { b'0' };
            let altered = String::from_utf8(bytes).unwrap();
            assert!(!verify_signature(&secret(), "O1", "P1", &altered));
        }
        assert!(!verify_signature(&secret(), "O1", "P2", &good));
        assert!(!verify_signature(&secret(), "O1", "P1", &good[..good.len() - 1]));
        assert!(!verify_signature(&SecretString::from("T"), "O1", "P1", &good));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "helloo"));
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(Money::parse("354").unwrap()).unwrap(), 35_400);
        assert_eq!(to_minor_units(Money::parse("149.995").unwrap()).unwrap(), 15_000);
        assert!(matches!(
            to_minor_units(Money::ZERO),
            Err(PaymentError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_gateway_order_json_shapes() {
        let order: GatewayOrder = serde_json::from_str(
            r#"{"id":"order_9A33XWu170gUtm","entity":"order","amount":35400,"currency":"INR","status":"created"}"#,
        )
        .unwrap();
        assert_eq!(order.order_id, "order_9A33XWu170gUtm");

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["orderId"], "order_9A33XWu170gUtm");
        assert_eq!(json["amount"], 35_400);
    }

    #[test]
    fn test_payment_intent_carries_key_id() {
        let gateway = PaymentGateway::new(&PaymentGatewayConfig {
            key_id: "rzp_test_K".to_owned(),
            key_secret: secret(),
            api_base: "http://127.0.0.1:9".to_owned(),
        })
        .unwrap();
        let intent = gateway.intent(GatewayOrder {
            order_id: "order_1".to_owned(),
            amount: 35_400,
            currency: "INR".to_owned(),
        });

        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["keyId"], "rzp_test_K");
        assert_eq!(json["orderId"], "order_1");
        assert_eq!(json["amount"], 35_400);
        assert_eq!(json["currency"], "INR");
    }
}
