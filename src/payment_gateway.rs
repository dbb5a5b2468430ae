//! Payment gateway adapter: order creation against the external provider and
//! HMAC verification of provider-signed completion callbacks.
//!
//! The signature check is the sole trust boundary for payment completion;
//! client-asserted success is never trusted without recomputation.

use bigdecimal::{BigDecimal, ToPrimitive};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::circuit_breaker::{create_provider_circuit_breaker, ProviderCircuitBreaker};
use crate::errors::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Fixed price per record. Single-currency by design.
pub const PRICE_PER_UNIT: &str = "0.50";
pub const CURRENCY: &str = "INR";

/// The fixed unit price as a decimal.
pub fn price_per_unit() -> BigDecimal {
    BigDecimal::from_str(PRICE_PER_UNIT).expect("PRICE_PER_UNIT is a valid decimal literal")
}

/// Compute the total charge and its minor-unit (paise) representation for a
/// requested quantity. Quantity must already be validated (>= 1).
pub fn order_amounts(quantity: i32) -> Result<(BigDecimal, i64), AppError> {
    let total = price_per_unit() * BigDecimal::from(quantity);
    let minor = (&total * BigDecimal::from(100))
        .round(0)
        .to_i64()
        .ok_or_else(|| {
            AppError::InternalError(format!("Order amount out of range for quantity {}", quantity))
        })?;
    Ok((total, minor))
}

/// Expected signature over `order_id + "|" + payment_id`, hex-encoded.
pub fn compute_signature(secret: &str, order_id: &str, payment_id: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time verification of a provider-supplied signature.
///
/// Non-hex input fails outright; otherwise `Mac::verify_slice` performs the
/// comparison without early exit. Provider signatures are lowercase hex and
/// the comparison is byte-for-byte, so uppercase digits never match.
pub fn verify_signature(secret: &str, order_id: &str, payment_id: &str, supplied: &str) -> bool {
    if supplied.bytes().any(|b| b.is_ascii_uppercase()) {
        return false;
    }
    let supplied_bytes = match hex::decode(supplied) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    mac.verify_slice(&supplied_bytes).is_ok()
}

/// Order object returned by the payment provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Client for the external payment provider's order API.
#[derive(Clone)]
pub struct PaymentGatewayClient {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
    breaker: Arc<ProviderCircuitBreaker>,
}

impl PaymentGatewayClient {
    /// Creates a new `PaymentGatewayClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the provider API.
    /// * `key_id` - The public key identifier (also handed to the client widget).
    /// * `key_secret` - The server-held secret; never logged or returned.
    pub fn new(base_url: String, key_id: String, key_secret: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create payment client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            key_id,
            key_secret,
            breaker: Arc::new(create_provider_circuit_breaker()),
        })
    }

    /// The public key identifier for client-side widget initialization.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Recompute-and-compare for a completion callback, using this client's
    /// secret.
    pub fn verify_callback_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        supplied: &str,
    ) -> bool {
        verify_signature(&self.key_secret, order_id, payment_id, supplied)
    }

    /// Request an order from the provider.
    ///
    /// # Arguments
    ///
    /// * `amount_minor` - The charge in minor currency units (paise).
    /// * `receipt` - Caller-side receipt identifier.
    /// * `notes` - Free-form notes attached to the provider order.
    pub async fn create_order(
        &self,
        amount_minor: i64,
        receipt: &str,
        notes: serde_json::Value,
    ) -> Result<ProviderOrder, AppError> {
        let url = format!("{}/orders", self.base_url);
        tracing::info!("Creating provider order: {} {} minor units", CURRENCY, amount_minor);

        let request = async {
            let response = self
                .client
                .post(&url)
                .basic_auth(&self.key_id, Some(&self.key_secret))
                .json(&json!({
                    "amount": amount_minor,
                    "currency": CURRENCY,
                    "receipt": receipt,
                    "notes": notes,
                }))
                .send()
                .await
                .map_err(|e| {
                    AppError::ExternalApiError(format!("Payment provider request failed: {}", e))
                })?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(AppError::ExternalApiError(format!(
                    "Payment provider returned {}: {}",
                    status, error_text
                )));
            }

            response.json::<ProviderOrder>().await.map_err(|e| {
                AppError::ExternalApiError(format!("Failed to parse provider response: {}", e))
            })
        };

        use failsafe::futures::CircuitBreaker;
        match self.breaker.call(request).await {
            Ok(order) => Ok(order),
            Err(failsafe::Error::Inner(e)) => Err(e),
            Err(failsafe::Error::Rejected) => Err(AppError::ExternalApiError(
                "Payment provider circuit open, retry later".to_string(),
            )),
        }
    }
}
