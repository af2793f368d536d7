//! Order quoting and commit engine.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use common::{AddressId, Money, OrderId, ProductId, UserId};
use domain::{
    GeoPoint, NewOrder, Order, OrderError, PaymentMethod, Quote, ResolvedLine, User,
};
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use store::{Store, StoreError};
use tracing::instrument;

use crate::catalog::Catalog;
use crate::error::{CheckoutError, Result};
use crate::notifier::Notifier;
use crate::services::PaymentGateway;
use crate::settings::CheckoutSettings;
use crate::templates::Template;

/// A requested order line, as received from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    pub product_id: String,
    pub quantity: u32,
}

impl LineRequest {
    pub fn new(product_id: impl std::fmt::Display, quantity: u32) -> Self {
        Self {
            product_id: product_id.to_string(),
            quantity,
        }
    }
}

/// Input to [`OrderEngine::commit`].
#[derive(Debug, Clone)]
pub struct CommitRequest {
    pub user_id: UserId,
    pub lines: Vec<LineRequest>,
    pub address_id: String,
    pub method: PaymentMethod,
    pub idempotency_key: Option<String>,
    pub location: Option<GeoPoint>,
}

/// Customer details pre-filled on the gateway checkout form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prefill {
    pub name: String,
    pub email: String,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutNotes {
    pub address: String,
}

/// Everything the client needs to open the gateway checkout form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutParams {
    pub gateway_key: String,
    /// Minor units.
    pub amount: i64,
    pub currency: String,
    pub order_intent_id: String,
    pub order_id: OrderId,
    pub name: String,
    pub description: String,
    pub callback_url: String,
    pub prefill: Prefill,
    pub notes: CheckoutNotes,
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Cash order, completed on commit.
    Cash { order_id: OrderId },
    /// Online order awaiting payment through the gateway.
    Online(CheckoutParams),
}

impl CommitOutcome {
    pub fn order_id(&self) -> OrderId {
        match self {
            CommitOutcome::Cash { order_id } => *order_id,
            CommitOutcome::Online(params) => params.order_id,
        }
    }
}

/// Prices requested lines against the live catalog and commits orders.
#[derive(Clone)]
pub struct OrderEngine<S> {
    store: S,
    catalog: Catalog<S>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Notifier<S>,
    settings: Arc<CheckoutSettings>,
}

impl<S: Store + Clone> OrderEngine<S> {
    pub fn new(
        store: S,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Notifier<S>,
        settings: Arc<CheckoutSettings>,
    ) -> Self {
        Self {
            catalog: Catalog::new(store.clone()),
            store,
            gateway,
            notifier,
            settings,
        }
    }

    /// Resolves one requested line against the active catalog.
    pub async fn resolve_line(&self, line: &LineRequest) -> Result<ResolvedLine> {
        let product_id = ProductId::parse(&line.product_id)?;
        if line.quantity == 0 {
            return Err(OrderError::InvalidQuantity {
                quantity: line.quantity,
            }
            .into());
        }
        let view = self.catalog.active_view(product_id).await?;
        Ok(ResolvedLine::new(view, line.quantity))
    }

    /// Prices the requested lines without persisting anything.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn quote(&self, lines: &[LineRequest]) -> Result<Quote> {
        self.quote_at(lines, Utc::now()).await
    }

    async fn quote_at(&self, lines: &[LineRequest], now: DateTime<Utc>) -> Result<Quote> {
        if lines.is_empty() {
            return Err(OrderError::EmptyOrder.into());
        }
        let resolved = try_join_all(lines.iter().map(|line| self.resolve_line(line))).await?;
        Ok(Quote::build(resolved, now, self.settings.delivery_days)?)
    }

    /// Commits an order for the requesting user.
    #[instrument(
        skip(self, request),
        fields(user_id = %request.user_id, method = %request.method)
    )]
    pub async fn commit(&self, request: CommitRequest) -> Result<CommitOutcome> {
        let started = Instant::now();
        let method = request.method;
        let outcome = self.commit_inner(request).await;
        metrics::histogram!("order_commit_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        if outcome.is_ok() {
            metrics::counter!("orders_committed_total", "method" => method.as_str())
                .increment(1);
        }
        outcome
    }

    async fn commit_inner(&self, request: CommitRequest) -> Result<CommitOutcome> {
        let CommitRequest {
            user_id,
            lines,
            address_id,
            method,
            idempotency_key,
            location,
        } = request;

        if lines.is_empty() {
            return Err(OrderError::EmptyOrder.into());
        }
        let address_id = AddressId::parse(&address_id)?;

        if let Some(key) = idempotency_key.as_deref()
            && let Some(existing) = self.store.find_by_idempotency_key(user_id, key).await?
        {
            tracing::info!(order_id = %existing.id, "replaying idempotent commit");
            return self.replay(existing).await;
        }

        let address = self
            .store
            .find_owned_address(user_id, address_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found("Address"))?;
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found("User"))?;

        let now = Utc::now();
        let quote = self.quote_at(&lines, now).await?;
        let order = Order::place(
            NewOrder {
                user_id,
                quote,
                address: address.snapshot(),
                method,
                location,
                idempotency_key,
                payment_window: self.settings.payment_window,
            },
            now,
        );

        match self.store.place_order(&order).await {
            Ok(()) => {}
            Err(StoreError::InsufficientStock { product_id }) => {
                let product_name = order
                    .lines
                    .iter()
                    .find(|l| l.product_id == product_id)
                    .map(|l| l.product_name.clone())
                    .unwrap_or_else(|| product_id.to_string());
                return Err(OrderError::OutOfStock { product_name }.into());
            }
            Err(StoreError::DuplicateIdempotencyKey { key }) => {
                // Lost a race against a retry carrying the same key
                let existing = self
                    .store
                    .find_by_idempotency_key(user_id, &key)
                    .await?
                    .ok_or_else(|| CheckoutError::Conflict(format!("duplicate commit {key}")))?;
                return self.replay(existing).await;
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(order_id = %order.id, amount = %order.payment_amount, "order placed");

        match method {
            PaymentMethod::Cash => {
                self.finish_cash(&order, &user).await;
                Ok(CommitOutcome::Cash { order_id: order.id })
            }
            PaymentMethod::Online => self.open_payment(order, &user).await,
        }
    }

    async fn finish_cash(&self, order: &Order, user: &User) {
        if let Err(e) = self.store.clear_cart(order.user_id).await {
            tracing::error!(error = %e, "failed to clear cart after cash order");
        }
        self.notifier
            .raise(domain::Notification::order_placed(order, Utc::now()))
            .await;
        self.notifier
            .email_order(Template::OrderPlaced, order, user)
            .await;
    }

    /// Creates the gateway intent for a freshly placed online order,
    /// discarding the order if that fails.
    async fn open_payment(&self, mut order: Order, user: &User) -> Result<CommitOutcome> {
        let intent = match self.create_intent(&order).await {
            Ok(intent) => intent,
            Err(e) => {
                self.compensate(order.id).await;
                return Err(e);
            }
        };

        order.attach_gateway_order(intent.id.clone());
        match self.store.update_order(&order, order.version).await {
            Ok(version) => order.version = version,
            Err(StoreError::ConcurrencyConflict { .. }) => {
                // Cancelled by its owner while the intent was being created;
                // that cancellation already restored the stock.
                tracing::warn!(order_id = %order.id, "order changed before payment could open");
                return Err(CheckoutError::Conflict(
                    "order was changed before payment could be opened".to_string(),
                ));
            }
            Err(e) => {
                self.compensate(order.id).await;
                return Err(e.into());
            }
        }

        Ok(CommitOutcome::Online(self.checkout_params(&order, &intent.id, user)))
    }

    async fn create_intent(&self, order: &Order) -> Result<crate::services::GatewayIntent> {
        let receipt = order.id.to_string();
        let request = self
            .gateway
            .create_intent(order.payment_amount, &self.settings.currency, &receipt);
        match tokio::time::timeout(self.settings.gateway_timeout, request).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CheckoutError::Timeout {
                service: "payment gateway",
            }),
        }
    }

    async fn compensate(&self, order_id: OrderId) {
        match self.store.discard_order(order_id).await {
            Ok(true) => tracing::warn!(%order_id, "order discarded after payment intent failure"),
            Ok(false) => tracing::info!(%order_id, "order already settled, nothing to discard"),
            Err(e) => tracing::error!(%order_id, error = %e, "failed to discard order"),
        }
    }

    /// Returns the original result of an already committed order.
    async fn replay(&self, order: Order) -> Result<CommitOutcome> {
        match (order.method, order.gateway_order_id.clone()) {
            (PaymentMethod::Cash, _) => Ok(CommitOutcome::Cash { order_id: order.id }),
            (PaymentMethod::Online, Some(intent_id)) => {
                let user = self
                    .store
                    .find_user(order.user_id)
                    .await?
                    .ok_or_else(|| CheckoutError::not_found("User"))?;
                Ok(CommitOutcome::Online(
                    self.checkout_params(&order, &intent_id, &user),
                ))
            }
            (PaymentMethod::Online, None) => Err(CheckoutError::Conflict(
                "order is still being committed".to_string(),
            )),
        }
    }

    fn checkout_params(&self, order: &Order, intent_id: &str, user: &User) -> CheckoutParams {
        let address = &order.address;
        CheckoutParams {
            gateway_key: self.gateway.key_id().to_string(),
            amount: order.payment_amount.minor_units(),
            currency: self.settings.currency.clone(),
            order_intent_id: intent_id.to_string(),
            order_id: order.id,
            name: self.settings.store_name.clone(),
            description: describe(order.lines.len(), order.payment_amount),
            callback_url: self.settings.callback_url.clone(),
            prefill: Prefill {
                name: user.username.clone(),
                email: user.email.clone(),
                contact: user.phone.clone(),
            },
            notes: CheckoutNotes {
                address: format!(
                    "{}, {}, {}, {} - {}",
                    address.full_name, address.address, address.city, address.state, address.pincode
                ),
            },
        }
    }
}

fn describe(line_count: usize, amount: Money) -> String {
    let noun = if line_count == 1 { "item" } else { "items" };
    format!("Payment of {amount} for {line_count} {noun}")
}
