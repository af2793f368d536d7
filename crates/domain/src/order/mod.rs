//! Orders: pricing, the persisted record and the status state machine.

mod model;
mod pricing;
mod state;

pub use model::{
    GeoPoint, NewOrder, Order, OrderLine, PaymentOutcome, ShippingAddress, generate_order_code,
};
pub use pricing::{DEFAULT_DELIVERY_DAYS, OrderTotals, Quote, ResolvedLine};
pub use state::{OrderStatus, PaymentMethod, PaymentStatus};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// Commit or quote request with no lines.
    #[error("Order must contain at least one product")]
    EmptyOrder,

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Requested quantity exceeds current stock.
    #[error("{product_name} is out of stock")]
    OutOfStock { product_name: String },

    #[error("Unknown order status: {value}")]
    UnknownStatus { value: String },

    #[error("Unknown payment method: {value}")]
    UnknownPaymentMethod { value: String },

    /// Admins may only request post-payment statuses.
    #[error("This status is not valid: {status}")]
    InvalidTargetStatus { status: OrderStatus },

    #[error("After DELIVERED and CANCELLED status you can not update status (current: {current})")]
    TerminalState { current: OrderStatus },

    #[error("Updated status is same as order status: {status}")]
    SameStatus { status: OrderStatus },

    /// Fulfilment statuses require a completed order.
    #[error("Order is awaiting payment and cannot move to {target}")]
    AwaitingPayment { target: OrderStatus },

    #[error("Cannot move order status backwards from {from} to {to}")]
    BackwardTransition { from: OrderStatus, to: OrderStatus },

    /// Order is not in the expected state.
    #[error("Invalid state transition: cannot {action} from {current} state")]
    InvalidStateTransition {
        current: OrderStatus,
        action: &'static str,
    },
}
