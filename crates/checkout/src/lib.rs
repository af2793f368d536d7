//! Checkout orchestration for the storefront.
//!
//! This crate ties the pure order rules in `domain` to persistence (`store`)
//! and to the external collaborators: the payment gateway and the mailer.
//!
//! # Services
//!
//! - [`Catalog`]: denormalized product views
//! - [`CartAggregator`]: per-user carts priced against the live catalog
//! - [`OrderEngine`]: quoting and committing orders (cash and online)
//! - [`PaymentVerifier`]: gateway signature checks and payment completion
//! - [`StatusMachine`]: admin status changes and customer cancellations
//! - [`ExpirySweeper`]: removal of unpaid online orders past their deadline
//! - [`OrderQueries`]: order listings and notifications
//! - [`RatingIntake`]: product ratings from customers

pub mod cart;
pub mod catalog;
pub mod error;
pub mod expiry;
pub mod notifier;
pub mod ordering;
pub mod payment;
pub mod queries;
pub mod rating;
pub mod services;
pub mod settings;
pub mod status;
pub mod templates;

#[cfg(test)]
mod testing;

use std::sync::Arc;

pub use cart::CartAggregator;
pub use catalog::Catalog;
pub use error::{CheckoutError, ErrorKind, Result};
pub use expiry::ExpirySweeper;
pub use notifier::Notifier;
pub use ordering::{
    CheckoutNotes, CheckoutParams, CommitOutcome, CommitRequest, LineRequest, OrderEngine,
    Prefill,
};
pub use payment::{PaymentCallback, PaymentConfirmation, PaymentVerifier};
pub use queries::{Customer, OrderDetails, OrderItem, OrderQueries};
pub use rating::RatingIntake;
pub use services::{
    GatewayError, HttpPaymentGateway, InMemoryMailer, InMemoryPaymentGateway, LogMailer,
    MailError, Mailer, PaymentGateway, SentEmail,
};
pub use settings::CheckoutSettings;
pub use status::{StatusChange, StatusMachine};
pub use templates::Template;

use store::Store;

/// All checkout services wired to one store, gateway and mailer.
#[derive(Clone)]
pub struct Checkout<S> {
    pub catalog: Catalog<S>,
    pub cart: CartAggregator<S>,
    pub orders: OrderEngine<S>,
    pub payments: PaymentVerifier<S>,
    pub status: StatusMachine<S>,
    pub queries: OrderQueries<S>,
    pub ratings: RatingIntake<S>,
    pub sweeper: ExpirySweeper<S>,
    pub settings: Arc<CheckoutSettings>,
}

impl<S: Store + Clone + 'static> Checkout<S> {
    pub fn new(
        store: S,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn Mailer>,
        settings: CheckoutSettings,
    ) -> Self {
        let settings = Arc::new(settings);
        let notifier = Notifier::new(store.clone(), mailer, settings.clone());

        Self {
            catalog: Catalog::new(store.clone()),
            cart: CartAggregator::new(store.clone()),
            orders: OrderEngine::new(
                store.clone(),
                gateway.clone(),
                notifier.clone(),
                settings.clone(),
            ),
            payments: PaymentVerifier::new(store.clone(), gateway, notifier.clone()),
            status: StatusMachine::new(store.clone(), notifier),
            queries: OrderQueries::new(store.clone()),
            ratings: RatingIntake::new(store.clone()),
            sweeper: ExpirySweeper::new(store, settings.sweep_interval),
            settings,
        }
    }
}
