//! Order line resolution results and quote totals.

use chrono::{DateTime, TimeDelta, Utc};
use common::{Money, ProductId};
use serde::Serialize;

use super::{OrderError, OrderLine};
use crate::catalog::ProductView;

/// Days between order placement and the promised delivery date.
pub const DEFAULT_DELIVERY_DAYS: i64 = 5;

/// A requested line priced against the live catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLine {
    pub product: ProductView,
    pub quantity: u32,
    /// Unit price captured at resolution time.
    pub order_product_price: Money,
    /// `order_product_price × quantity`.
    pub line_total: Money,
    /// `list price × quantity`.
    pub list_total: Money,
}

impl ResolvedLine {
    /// Snapshots the current price of `product` for `quantity` units.
    pub fn new(product: ProductView, quantity: u32) -> Self {
        Self {
            order_product_price: product.price,
            line_total: product.price.multiply(quantity),
            list_total: product.list_price.multiply(quantity),
            product,
            quantity,
        }
    }

    /// Converts to the immutable line stored on an order.
    pub fn to_order_line(&self) -> OrderLine {
        OrderLine {
            product_id: self.product.id,
            product_name: self.product.name.clone(),
            order_product_price: self.order_product_price,
            list_price: self.product.list_price,
            quantity: self.quantity,
        }
    }
}

/// The three order amounts. `discount_amount = total_amount - payment_amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub total_amount: Money,
    pub discount_amount: Money,
    pub payment_amount: Money,
}

impl OrderTotals {
    /// Builds totals from `(list_total, payment_total)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Money, Money)>) -> Self {
        let (total_amount, payment_amount) = pairs
            .into_iter()
            .fold((Money::zero(), Money::zero()), |(list, pay), (l, p)| {
                (list + l, pay + p)
            });
        Self {
            total_amount,
            discount_amount: total_amount - payment_amount,
            payment_amount,
        }
    }

    pub fn of_resolved(lines: &[ResolvedLine]) -> Self {
        Self::from_pairs(lines.iter().map(|l| (l.list_total, l.line_total)))
    }

    pub fn of_order_lines(lines: &[OrderLine]) -> Self {
        Self::from_pairs(lines.iter().map(|l| (l.list_total(), l.line_total())))
    }
}

/// A validated, priced candidate order. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub lines: Vec<ResolvedLine>,
    #[serde(flatten)]
    pub totals: OrderTotals,
    pub delivery_date: DateTime<Utc>,
}

impl Quote {
    /// Checks stock for every product and totals the lines.
    ///
    /// Lines for the same product are checked against its stock together.
    /// Fails with [`OrderError::OutOfStock`] naming the first product whose
    /// requested quantity exceeds its stock.
    pub fn build(
        lines: Vec<ResolvedLine>,
        now: DateTime<Utc>,
        delivery_days: i64,
    ) -> Result<Self, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        if let Some(product) = first_short_product(&lines) {
            return Err(OrderError::OutOfStock {
                product_name: product.name.clone(),
            });
        }
        Ok(Self {
            totals: OrderTotals::of_resolved(&lines),
            lines,
            delivery_date: delivery_date(now, delivery_days),
        })
    }

    /// Per-product quantities, used for the atomic stock decrement.
    pub fn stock_requests(&self) -> Vec<(ProductId, u32)> {
        self.lines
            .iter()
            .map(|l| (l.product.id, l.quantity))
            .collect()
    }

    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.lines.iter().map(ResolvedLine::to_order_line).collect()
    }
}

fn first_short_product(lines: &[ResolvedLine]) -> Option<&ProductView> {
    let mut requested: Vec<(&ProductView, u32)> = Vec::new();
    for line in lines {
        match requested.iter_mut().find(|(p, _)| p.id == line.product.id) {
            Some((_, total)) => *total = total.saturating_add(line.quantity),
            None => requested.push((&line.product, line.quantity)),
        }
    }
    requested
        .into_iter()
        .find(|(product, total)| *total > product.stock)
        .map(|(product, _)| product)
}

/// `now` plus `days`, or plus the default when `days` is out of range.
fn delivery_date(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    TimeDelta::try_days(days)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or_else(|| now + TimeDelta::days(DEFAULT_DELIVERY_DAYS))
}
