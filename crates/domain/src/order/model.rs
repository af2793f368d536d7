//! The persisted order record and its lifecycle mutations.

use chrono::{DateTime, Duration, Utc};
use common::{Money, OrderId, ProductId, UserId};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{OrderError, OrderStatus, OrderTotals, PaymentMethod, PaymentStatus, Quote};

/// An ordered product with prices frozen at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    /// Selling price per unit at commit time.
    pub order_product_price: Money,
    /// List price per unit at commit time.
    pub list_price: Money,
    pub quantity: u32,
}

impl OrderLine {
    pub fn line_total(&self) -> Money {
        self.order_product_price.multiply(self.quantity)
    }

    pub fn list_total(&self) -> Money {
        self.list_price.multiply(self.quantity)
    }
}

/// Delivery address copied onto the order at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub alternate_phone: Option<String>,
    pub state: String,
    pub city: String,
    pub address: String,
    pub pincode: String,
    pub address_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Everything needed to place an order from a validated quote.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub quote: Quote,
    pub address: ShippingAddress,
    pub method: PaymentMethod,
    pub location: Option<GeoPoint>,
    pub idempotency_key: Option<String>,
    /// How long an unpaid online order is kept before the sweeper removes it.
    pub payment_window: Duration,
}

/// A committed order.
///
/// Line snapshots and the three amounts are fixed when the order is placed.
/// Status changes go through [`Order::apply_admin_status`],
/// [`Order::cancel_by_owner`] and [`Order::mark_paid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Human-readable code, assigned once the order is completed.
    pub order_code: Option<String>,
    pub user_id: UserId,
    pub lines: Vec<OrderLine>,
    pub total_amount: Money,
    pub discount_amount: Money,
    pub payment_amount: Money,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub method: PaymentMethod,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub address: ShippingAddress,
    pub is_cancelled: bool,
    pub cancel_date: Option<DateTime<Utc>>,
    pub date: DateTime<Utc>,
    pub delivery_date: DateTime<Utc>,
    pub location: Option<GeoPoint>,
    /// Deadline for payment; set only while an online order is unpaid.
    pub expires_at: Option<DateTime<Utc>>,
    pub idempotency_key: Option<String>,
    /// Optimistic concurrency counter, bumped by the store on every update.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of applying a payment confirmation to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The order moved from pending to paid.
    Confirmed,
    /// The order had already been paid; nothing changed.
    AlreadyPaid,
}

impl Order {
    /// Places an order from a quote.
    ///
    /// Cash orders are completed immediately and receive their order code;
    /// online orders start pending with a payment deadline.
    pub fn place(new: NewOrder, now: DateTime<Utc>) -> Self {
        let NewOrder {
            user_id,
            quote,
            address,
            method,
            location,
            idempotency_key,
            payment_window,
        } = new;

        let lines = quote.order_lines();
        let totals = quote.totals;

        let (status, order_code, expires_at) = match method {
            PaymentMethod::Cash => (OrderStatus::Completed, Some(generate_order_code(now)), None),
            PaymentMethod::Online => {
                let deadline = now
                    .checked_add_signed(payment_window)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                (OrderStatus::Pending, None, Some(deadline))
            }
        };

        Self {
            id: OrderId::new(),
            order_code,
            user_id,
            lines,
            total_amount: totals.total_amount,
            discount_amount: totals.discount_amount,
            payment_amount: totals.payment_amount,
            status,
            payment_status: PaymentStatus::Pending,
            method,
            gateway_order_id: None,
            gateway_payment_id: None,
            address,
            is_cancelled: false,
            cancel_date: None,
            date: now,
            delivery_date: quote.delivery_date,
            location,
            expires_at,
            idempotency_key,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn totals(&self) -> OrderTotals {
        OrderTotals {
            total_amount: self.total_amount,
            discount_amount: self.discount_amount,
            payment_amount: self.payment_amount,
        }
    }

    /// Returns true if the stored amounts agree with the line snapshots.
    pub fn totals_consistent(&self) -> bool {
        OrderTotals::of_order_lines(&self.lines) == self.totals()
    }

    /// Per-product quantities for stock decrement and restore.
    pub fn stock_requests(&self) -> Vec<(ProductId, u32)> {
        self.lines.iter().map(|l| (l.product_id, l.quantity)).collect()
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    /// Returns true while the order has neither been paid nor moved on.
    pub fn awaits_payment(&self) -> bool {
        self.status == OrderStatus::Pending && self.payment_status == PaymentStatus::Pending
    }

    /// Returns true if this is an unpaid online order past its deadline.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.awaits_payment() && self.expires_at.is_some_and(|deadline| deadline <= now)
    }

    /// Label used in notices: the order code once assigned, otherwise the id.
    pub fn reference(&self) -> String {
        self.order_code
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }

    /// Records the payment intent created at the gateway.
    pub fn attach_gateway_order(&mut self, gateway_order_id: impl Into<String>) {
        self.gateway_order_id = Some(gateway_order_id.into());
    }

    /// Applies a verified gateway payment.
    pub fn mark_paid(
        &mut self,
        gateway_payment_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<PaymentOutcome, OrderError> {
        if self.is_paid() || self.status == OrderStatus::Completed {
            return Ok(PaymentOutcome::AlreadyPaid);
        }
        if self.status != OrderStatus::Pending {
            return Err(OrderError::InvalidStateTransition {
                current: self.status,
                action: "confirm payment",
            });
        }

        self.payment_status = PaymentStatus::Paid;
        self.status = OrderStatus::Completed;
        self.gateway_payment_id = Some(gateway_payment_id.into());
        self.expires_at = None;
        if self.order_code.is_none() {
            self.order_code = Some(generate_order_code(now));
        }
        self.updated_at = now;
        Ok(PaymentOutcome::Confirmed)
    }

    /// Applies an admin status change, returning the previous status.
    pub fn apply_admin_status(
        &mut self,
        target: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<OrderStatus, OrderError> {
        self.status.check_admin_transition(target)?;
        Ok(self.transition(target, now))
    }

    /// Cancels on behalf of the owning customer, returning the previous status.
    pub fn cancel_by_owner(&mut self, now: DateTime<Utc>) -> Result<OrderStatus, OrderError> {
        self.status.check_cancellation()?;
        Ok(self.transition(OrderStatus::Cancelled, now))
    }

    fn transition(&mut self, target: OrderStatus, now: DateTime<Utc>) -> OrderStatus {
        let previous = self.status;
        match target {
            OrderStatus::Cancelled => {
                self.is_cancelled = true;
                self.cancel_date = Some(now);
                self.expires_at = None;
            }
            OrderStatus::Delivered if self.method == PaymentMethod::Cash => {
                self.payment_status = PaymentStatus::Paid;
            }
            _ => {}
        }
        self.status = target;
        self.updated_at = now;
        previous
    }
}

/// Generates a human-readable order code such as `ORD-261017-482913`.
pub fn generate_order_code(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("ORD-{}-{suffix:06}", now.format("%y%m%d"))
}
