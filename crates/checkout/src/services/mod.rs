//! External collaborator traits with in-memory and production implementations.

pub mod gateway;
pub mod mailer;

pub use gateway::{
    GatewayError, GatewayIntent, HttpPaymentGateway, InMemoryPaymentGateway, PaymentGateway,
    sign_payment, verify_payment_signature,
};
pub use mailer::{InMemoryMailer, LogMailer, MailError, Mailer, SentEmail};
