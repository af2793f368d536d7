//! Order status state machine.

use serde::{Deserialize, Serialize};

use super::OrderError;

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──► Completed ──► Shipped ──► OutForDelivery ──► Delivered
///    │            │            │              │
///    └────────────┴────────────┴──────────────┴──► Cancelled
/// ```
///
/// `Pending` and `Completed` are only entered through commit and payment
/// verification. Admins drive everything after `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Committed online order awaiting payment.
    #[default]
    Pending,

    /// Paid (online) or accepted (cash) and ready for fulfilment.
    Completed,

    /// Handed to the carrier.
    Shipped,

    /// With the courier for final delivery.
    OutForDelivery,

    /// Received by the customer (terminal state).
    Delivered,

    /// Cancelled by the customer or an admin (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Statuses an admin may request through the status endpoint.
    pub const ADMIN_TARGETS: [OrderStatus; 4] = [
        OrderStatus::Shipped,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns true if an admin may move an order into this status.
    pub fn is_admin_target(&self) -> bool {
        Self::ADMIN_TARGETS.contains(self)
    }

    /// Position along the forward fulfilment path. `Cancelled` sits off the path.
    fn rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Completed => Some(1),
            OrderStatus::Shipped => Some(2),
            OrderStatus::OutForDelivery => Some(3),
            OrderStatus::Delivered => Some(4),
            OrderStatus::Cancelled => None,
        }
    }

    /// Validates an admin-requested transition from `self` to `target`.
    ///
    /// Guards are checked in order: valid target, terminal source, same
    /// status, unpaid source, forward-only.
    pub fn check_admin_transition(&self, target: OrderStatus) -> Result<(), OrderError> {
        if !target.is_admin_target() {
            return Err(OrderError::InvalidTargetStatus { status: target });
        }
        self.check_common_guards(target)?;

        if target == OrderStatus::Cancelled {
            return Ok(());
        }

        if *self == OrderStatus::Pending {
            return Err(OrderError::AwaitingPayment { target });
        }

        match (self.rank(), target.rank()) {
            (Some(from), Some(to)) if to > from => Ok(()),
            _ => Err(OrderError::BackwardTransition {
                from: *self,
                to: target,
            }),
        }
    }

    /// Validates a customer-initiated cancellation.
    pub fn check_cancellation(&self) -> Result<(), OrderError> {
        self.check_common_guards(OrderStatus::Cancelled)
    }

    fn check_common_guards(&self, target: OrderStatus) -> Result<(), OrderError> {
        if self.is_terminal() {
            return Err(OrderError::TerminalState { current: *self });
        }
        if *self == target {
            return Err(OrderError::SameStatus { status: target });
        }
        Ok(())
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "PENDING" => Ok(OrderStatus::Pending),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "OUT_FOR_DELIVERY" => Ok(OrderStatus::OutForDelivery),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            _ => Err(OrderError::UnknownStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// Whether the money for an order has been collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(PaymentStatus::Pending),
            "PAID" => Ok(PaymentStatus::Paid),
            _ => Err(OrderError::UnknownStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash on delivery; no gateway interaction.
    Cash,
    /// Paid up front through the payment gateway.
    Online,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Online => "ONLINE",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CASH" => Ok(PaymentMethod::Cash),
            "ONLINE" => Ok(PaymentMethod::Online),
            _ => Err(OrderError::UnknownPaymentMethod {
                value: s.to_string(),
            }),
        }
    }
}
