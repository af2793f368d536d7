//! Payment gateway adapter: intent creation and signature verification.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::Money;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::instrument;

type HmacSha256 = Hmac<Sha256>;

/// Errors returned by a payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Payment gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Payment gateway rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Payment gateway unavailable: {0}")]
    Unavailable(String),
}

/// A payment intent created at the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayIntent {
    pub id: String,
}

/// Trait for payment gateway operations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Public key identifier handed to the client checkout form.
    fn key_id(&self) -> &str;

    /// Creates a payment intent for `amount` (sent in minor units).
    async fn create_intent(
        &self,
        amount: Money,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayIntent, GatewayError>;

    /// Checks the signature the gateway returned to the client after payment.
    fn verify_signature(
        &self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        signature: &str,
    ) -> bool;
}

fn payment_mac(secret: &str, gateway_order_id: &str, gateway_payment_id: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(gateway_order_id.as_bytes());
    mac.update(b"|");
    mac.update(gateway_payment_id.as_bytes());
    Some(mac)
}

/// Hex-encoded HMAC-SHA256 of `order_id|payment_id`.
pub fn sign_payment(secret: &str, gateway_order_id: &str, gateway_payment_id: &str) -> Option<String> {
    payment_mac(secret, gateway_order_id, gateway_payment_id)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a hex signature against `order_id|payment_id` in constant time.
pub fn verify_payment_signature(
    secret: &str,
    gateway_order_id: &str,
    gateway_payment_id: &str,
    signature: &str,
) -> bool {
    let Ok(provided) = hex::decode(signature.trim()) else {
        return false;
    };
    payment_mac(secret, gateway_order_id, gateway_payment_id)
        .is_some_and(|mac| mac.verify_slice(&provided).is_ok())
}

#[derive(Debug)]
struct InMemoryGatewayState {
    intents: HashMap<String, (Money, String, String)>,
    next_id: u32,
    fail_on_create: bool,
    delay: Option<Duration>,
}

/// In-memory payment gateway for development and tests.
///
/// Intent ids are sequential (`order_0001`, `order_0002`, ...).
#[derive(Debug, Clone)]
pub struct InMemoryPaymentGateway {
    key_id: String,
    secret: String,
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    pub fn new(key_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            secret: secret.into(),
            state: Arc::new(RwLock::new(InMemoryGatewayState {
                intents: HashMap::new(),
                next_id: 0,
                fail_on_create: false,
                delay: None,
            })),
        }
    }

    /// Configures the gateway to fail intent creation.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Makes every intent creation wait before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.state.write().unwrap().delay = delay;
    }

    pub fn intent_count(&self) -> usize {
        self.state.read().unwrap().intents.len()
    }

    /// Amount, currency and receipt recorded for an intent.
    pub fn intent(&self, intent_id: &str) -> Option<(Money, String, String)> {
        self.state.read().unwrap().intents.get(intent_id).cloned()
    }

    /// Produces the signature the gateway would hand the client after payment.
    pub fn sign(&self, gateway_order_id: &str, gateway_payment_id: &str) -> String {
        sign_payment(&self.secret, gateway_order_id, gateway_payment_id).unwrap_or_default()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn create_intent(
        &self,
        amount: Money,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayIntent, GatewayError> {
        let delay = self.state.read().unwrap().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().unwrap();
        if state.fail_on_create {
            return Err(GatewayError::Unavailable("intent creation declined".to_string()));
        }

        state.next_id += 1;
        let id = format!("order_{:04}", state.next_id);
        state
            .intents
            .insert(id.clone(), (amount, currency.to_string(), receipt.to_string()));

        Ok(GatewayIntent { id })
    }

    fn verify_signature(
        &self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        signature: &str,
    ) -> bool {
        verify_payment_signature(&self.secret, gateway_order_id, gateway_payment_id, signature)
    }
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: String,
}

/// Gateway adapter speaking the hosted gateway's REST API.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl HttpPaymentGateway {
    pub fn new(
        base_url: impl Into<String>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    #[instrument(skip(self), fields(amount = amount.minor_units()))]
    async fn create_intent(
        &self,
        amount: Money,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayIntent, GatewayError> {
        let url = format!("{}/v1/orders", self.base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&CreateOrderRequest {
                amount: amount.minor_units(),
                currency,
                receipt,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "payment gateway rejected intent");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreateOrderResponse = response.json().await?;
        tracing::debug!(intent_id = %created.id, "payment intent created");
        Ok(GatewayIntent { id: created.id })
    }

    fn verify_signature(
        &self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        signature: &str,
    ) -> bool {
        verify_payment_signature(
            &self.key_secret,
            gateway_order_id,
            gateway_payment_id,
            signature,
        )
    }
}
