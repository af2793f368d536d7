//! Cart lines and cart-level pricing.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{Money, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::catalog::ProductView;

/// One product in a user's cart. At most one line exists per (user, product).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub user_id: UserId,
    pub product_id: ProductId,
    /// Always at least 1; a line set to 0 is deleted instead.
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartLine {
    /// Creates a fresh line with quantity 1.
    pub fn new(user_id: UserId, product_id: ProductId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            product_id,
            quantity: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A cart line priced against the current catalog view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub product_id: ProductId,
    pub quantity: u32,
    /// The product view, absent when the product no longer exists.
    pub product: Option<ProductView>,
    /// False when the product is missing or deactivated; such lines carry
    /// zero totals and are excluded from cart totals.
    pub available: bool,
    pub line_list_total: Money,
    pub line_payment_total: Money,
    pub line_discount: Money,
}

/// Cart lines with cart-level totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub lines: Vec<CartLineView>,
    /// Sum of list price × quantity over available lines.
    pub total_amount: Money,
    pub discount_amount: Money,
    /// Sum of selling price × quantity over available lines.
    pub payment_amount: Money,
}

impl CartSummary {
    /// Number of lines that can currently be ordered.
    pub fn available_count(&self) -> usize {
        self.lines.iter().filter(|l| l.available).count()
    }
}

/// Prices each line against `views` and totals the available ones.
pub fn summarize(lines: &[CartLine], views: &HashMap<ProductId, ProductView>) -> CartSummary {
    let priced: Vec<CartLineView> = lines
        .iter()
        .map(|line| {
            let product = views.get(&line.product_id).cloned();
            match product {
                Some(view) if view.is_active => {
                    let line_list_total = view.list_price.multiply(line.quantity);
                    let line_payment_total = view.price.multiply(line.quantity);
                    CartLineView {
                        product_id: line.product_id,
                        quantity: line.quantity,
                        product: Some(view),
                        available: true,
                        line_list_total,
                        line_payment_total,
                        line_discount: line_list_total - line_payment_total,
                    }
                }
                other => CartLineView {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    product: other,
                    available: false,
                    line_list_total: Money::zero(),
                    line_payment_total: Money::zero(),
                    line_discount: Money::zero(),
                },
            }
        })
        .collect();

    let total_amount: Money = priced.iter().map(|l| l.line_list_total).sum();
    let payment_amount: Money = priced.iter().map(|l| l.line_payment_total).sum();

    CartSummary {
        lines: priced,
        total_amount,
        discount_amount: total_amount - payment_amount,
        payment_amount,
    }
}
