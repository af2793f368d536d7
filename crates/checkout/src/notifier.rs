//! Notification emitter: in-app notices and best-effort email.

use std::sync::Arc;

use domain::{Notification, Order, User};
use store::Store;
use tracing::instrument;

use crate::services::Mailer;
use crate::settings::CheckoutSettings;
use crate::templates::Template;

/// Raises notifications and sends email on behalf of the other services.
///
/// Nothing here fails the calling operation: storage and delivery problems
/// are logged and, for email, reported as `false`.
#[derive(Clone)]
pub struct Notifier<S> {
    store: S,
    mailer: Arc<dyn Mailer>,
    settings: Arc<CheckoutSettings>,
}

impl<S: Store> Notifier<S> {
    pub fn new(store: S, mailer: Arc<dyn Mailer>, settings: Arc<CheckoutSettings>) -> Self {
        Self {
            store,
            mailer,
            settings,
        }
    }

    /// Persists an in-app notification.
    pub async fn raise(&self, notification: Notification) {
        if let Err(e) = self.store.insert_notification(&notification).await {
            tracing::error!(
                error = %e,
                title = %notification.title,
                "failed to store notification"
            );
        }
    }

    /// Renders and sends an order email within the mail timeout.
    ///
    /// Returns true if the transport accepted the message.
    #[instrument(skip(self, order, user), fields(order_id = %order.id))]
    pub async fn email_order(&self, template: Template, order: &Order, user: &User) -> bool {
        let html = template.render(&[
            ("storeName", self.settings.store_name.clone()),
            ("username", user.username.clone()),
            ("orderRef", order.reference()),
            ("newStatus", order.status.to_string()),
            ("amount", order.payment_amount.to_string()),
            ("deliveryDate", order.delivery_date.format("%d %b %Y").to_string()),
            ("redirectUrl", self.settings.order_url(order.id)),
        ]);

        let send = self.mailer.send(&user.email, template.subject(), &html);
        match tokio::time::timeout(self.settings.mail_timeout, send).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                metrics::counter!("emails_failed_total").increment(1);
                tracing::warn!(error = %e, "email delivery failed");
                false
            }
            Err(_) => {
                metrics::counter!("emails_failed_total").increment(1);
                tracing::warn!(timeout = ?self.settings.mail_timeout, "email delivery timed out");
                false
            }
        }
    }

    /// Emails the order's owner, looking them up first.
    pub async fn email_owner(&self, template: Template, order: &Order) -> bool {
        match self.store.find_user(order.user_id).await {
            Ok(Some(user)) => self.email_order(template, order, &user).await,
            Ok(None) => {
                tracing::warn!(user_id = %order.user_id, "order owner not found, email skipped");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load order owner");
                false
            }
        }
    }
}
