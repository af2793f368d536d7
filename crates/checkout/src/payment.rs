//! Payment verification.

use std::sync::Arc;

use chrono::Utc;
use common::OrderId;
use domain::{Notification, Order, PaymentOutcome};
use serde::Deserialize;
use store::{Store, StoreError};
use tracing::instrument;

use crate::error::{CheckoutError, Result};
use crate::notifier::Notifier;
use crate::services::PaymentGateway;
use crate::templates::Template;

/// Attempts at applying a payment before giving up on version conflicts.
const MAX_ATTEMPTS: usize = 3;

/// The callback the gateway's checkout form hands back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCallback {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
}

/// Result of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub order_id: OrderId,
    pub outcome: PaymentOutcome,
}

/// Verifies gateway payment callbacks and completes online orders.
#[derive(Clone)]
pub struct PaymentVerifier<S> {
    store: S,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Notifier<S>,
}

impl<S: Store + Clone> PaymentVerifier<S> {
    pub fn new(store: S, gateway: Arc<dyn PaymentGateway>, notifier: Notifier<S>) -> Self {
        Self {
            store,
            gateway,
            notifier,
        }
    }

    /// Checks the callback signature and marks the order paid.
    ///
    /// Repeat calls for an already paid order succeed without side effects.
    #[instrument(skip(self, callback), fields(gateway_order_id = %callback.gateway_order_id))]
    pub async fn verify(&self, callback: &PaymentCallback) -> Result<PaymentConfirmation> {
        let result = self.verify_inner(callback).await;
        let outcome = match &result {
            Ok(c) if c.outcome == PaymentOutcome::Confirmed => "confirmed",
            Ok(_) => "already_paid",
            Err(CheckoutError::PaymentVerificationFailed) => "invalid_signature",
            Err(_) => "failed",
        };
        metrics::counter!("payments_verified_total", "outcome" => outcome).increment(1);
        result
    }

    async fn verify_inner(&self, callback: &PaymentCallback) -> Result<PaymentConfirmation> {
        if !self.gateway.verify_signature(
            &callback.gateway_order_id,
            &callback.gateway_payment_id,
            &callback.signature,
        ) {
            tracing::warn!("payment signature mismatch");
            return Err(CheckoutError::PaymentVerificationFailed);
        }

        let mut order = self.load(&callback.gateway_order_id).await?;
        for _ in 0..MAX_ATTEMPTS {
            let expected = order.version;
            match order.mark_paid(&callback.gateway_payment_id, Utc::now())? {
                PaymentOutcome::AlreadyPaid => {
                    tracing::info!(order_id = %order.id, "payment already applied");
                    return Ok(PaymentConfirmation {
                        order_id: order.id,
                        outcome: PaymentOutcome::AlreadyPaid,
                    });
                }
                PaymentOutcome::Confirmed => {}
            }

            match self.store.update_order(&order, expected).await {
                Ok(version) => {
                    order.version = version;
                    self.after_payment(&order).await;
                    return Ok(PaymentConfirmation {
                        order_id: order.id,
                        outcome: PaymentOutcome::Confirmed,
                    });
                }
                Err(StoreError::ConcurrencyConflict { .. }) => {
                    tracing::debug!(order_id = %order.id, "payment raced another update, retrying");
                    order = self.load(&callback.gateway_order_id).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CheckoutError::Conflict(
            "order was modified concurrently".to_string(),
        ))
    }

    async fn load(&self, gateway_order_id: &str) -> Result<Order> {
        self.store
            .find_by_gateway_order_id(gateway_order_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(gateway_order_id, "payment for unknown or expired order");
                CheckoutError::not_found("Order")
            })
    }

    async fn after_payment(&self, order: &Order) {
        tracing::info!(order_id = %order.id, "payment confirmed");
        if let Err(e) = self.store.clear_cart(order.user_id).await {
            tracing::error!(error = %e, "failed to clear cart after payment");
        }
        self.notifier
            .raise(Notification::order_placed(order, Utc::now()))
            .await;
        self.notifier
            .email_owner(Template::OrderPlaced, order)
            .await;
    }
}
