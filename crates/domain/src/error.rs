//! Domain error types.

use thiserror::Error;

use crate::order::OrderError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// An error occurred in order pricing or a status transition.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Star rating outside `1..=5`.
    #[error("Invalid rating: {star} (must be between 1 and 5)")]
    InvalidRating { star: i64 },
}
