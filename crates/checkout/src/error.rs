//! Checkout error types.

use common::IdParseError;
use domain::{DomainError, OrderError};
use store::StoreError;
use thiserror::Error;

use crate::services::{GatewayError, MailError};

/// Coarse classification of a failure, used for logging, metrics and
/// rendering at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input, invalid target status or bad payment signature.
    Validation,
    /// A referenced record does not exist (or is not visible to the caller).
    NotFound,
    /// The request is well-formed but conflicts with current state.
    Conflict,
    /// The payment gateway or mail transport failed or timed out.
    ExternalService,
    /// Storage failures and other unexpected errors.
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::ExternalService => "external_service",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A malformed identifier.
    #[error(transparent)]
    InvalidId(#[from] IdParseError),

    /// Missing or invalid request data.
    #[error("{0}")]
    Validation(String),

    /// A referenced record does not exist.
    #[error("{entity} is not found")]
    NotFound { entity: &'static str },

    /// Order pricing or state machine rule violated.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Domain rule violated.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The request conflicts with current state.
    #[error("{0}")]
    Conflict(String),

    /// The gateway signature did not match.
    #[error("payment verification failed")]
    PaymentVerificationFailed,

    /// An external call did not complete in time.
    #[error("{service} did not respond in time")]
    Timeout { service: &'static str },

    /// Payment gateway error.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Mail transport error.
    #[error(transparent)]
    Mail(#[from] MailError),

    /// Store error.
    #[error(transparent)]
    Store(StoreError),
}

impl CheckoutError {
    pub fn not_found(entity: &'static str) -> Self {
        CheckoutError::NotFound { entity }
    }

    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckoutError::InvalidId(_)
            | CheckoutError::Validation(_)
            | CheckoutError::PaymentVerificationFailed => ErrorKind::Validation,
            CheckoutError::NotFound { .. } => ErrorKind::NotFound,
            CheckoutError::Conflict(_) => ErrorKind::Conflict,
            CheckoutError::Order(err) => order_error_kind(err),
            CheckoutError::Domain(DomainError::Order(err)) => order_error_kind(err),
            CheckoutError::Domain(DomainError::InvalidRating { .. }) => ErrorKind::Validation,
            CheckoutError::Timeout { .. }
            | CheckoutError::Gateway(_)
            | CheckoutError::Mail(_) => ErrorKind::ExternalService,
            CheckoutError::Store(err) => match err {
                StoreError::NotFound { .. } => ErrorKind::NotFound,
                StoreError::InsufficientStock { .. }
                | StoreError::ConcurrencyConflict { .. }
                | StoreError::DuplicateIdempotencyKey { .. } => ErrorKind::Conflict,
                _ => ErrorKind::Internal,
            },
        }
    }
}

fn order_error_kind(err: &OrderError) -> ErrorKind {
    match err {
        OrderError::EmptyOrder
        | OrderError::InvalidQuantity { .. }
        | OrderError::UnknownStatus { .. }
        | OrderError::UnknownPaymentMethod { .. }
        | OrderError::InvalidTargetStatus { .. } => ErrorKind::Validation,
        OrderError::OutOfStock { .. }
        | OrderError::TerminalState { .. }
        | OrderError::SameStatus { .. }
        | OrderError::AwaitingPayment { .. }
        | OrderError::BackwardTransition { .. }
        | OrderError::InvalidStateTransition { .. } => ErrorKind::Conflict,
    }
}

impl From<StoreError> for CheckoutError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, .. } => CheckoutError::NotFound { entity },
            other => CheckoutError::Store(other),
        }
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
