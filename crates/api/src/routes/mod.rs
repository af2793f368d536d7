//! HTTP route handlers.

pub mod admin;
pub mod cart;
pub mod health;
pub mod metrics;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod products;
pub mod ratings;

use checkout::Checkout;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub checkout: Checkout<S>,
}
