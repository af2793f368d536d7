//! Order status state machine service.

use chrono::Utc;
use common::{OrderId, UserId};
use domain::{Notification, Order, OrderError, OrderStatus};
use serde::Serialize;
use store::Store;
use tracing::instrument;

use crate::error::{CheckoutError, Result};
use crate::notifier::Notifier;
use crate::templates::Template;

/// Result of a persisted status change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub order: Order,
    pub previous: OrderStatus,
    /// False when the notice email failed or timed out.
    pub email_delivered: bool,
}

/// Drives admin status transitions and customer cancellations.
///
/// The new status is always persisted before any email is attempted, and a
/// private notification is raised for the owner regardless of delivery.
#[derive(Clone)]
pub struct StatusMachine<S> {
    store: S,
    notifier: Notifier<S>,
}

impl<S: Store + Clone> StatusMachine<S> {
    pub fn new(store: S, notifier: Notifier<S>) -> Self {
        Self { store, notifier }
    }

    /// Applies an admin-requested status.
    #[instrument(skip(self))]
    pub async fn set_status(&self, order_id: &str, status: &str) -> Result<StatusChange> {
        let target: OrderStatus = status.parse()?;
        if !target.is_admin_target() {
            return Err(OrderError::InvalidTargetStatus { status: target }.into());
        }
        let order_id = OrderId::parse(order_id)?;
        let mut order = self.load(order_id).await?;

        let expected = order.version;
        let previous = order.apply_admin_status(target, Utc::now())?;
        self.persist(&mut order, expected).await?;

        tracing::info!(%order_id, from = %previous, to = %target, "order status changed");
        Ok(self.announce(order, previous).await)
    }

    /// Cancels an order on behalf of its owner.
    ///
    /// Orders owned by someone else are reported as not found.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn cancel_by_user(&self, user_id: UserId, order_id: &str) -> Result<StatusChange> {
        let order_id = OrderId::parse(order_id)?;
        let mut order = self.load(order_id).await?;
        if !order.is_owned_by(user_id) {
            return Err(CheckoutError::not_found("Order"));
        }

        let expected = order.version;
        let previous = order.cancel_by_owner(Utc::now())?;
        self.persist(&mut order, expected).await?;

        tracing::info!(%order_id, from = %previous, "order cancelled by customer");
        Ok(self.announce(order, previous).await)
    }

    async fn load(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found("Order"))
    }

    async fn persist(&self, order: &mut Order, expected: i64) -> Result<()> {
        let version = if order.status == OrderStatus::Cancelled {
            self.store
                .update_order_restoring_stock(order, expected)
                .await?
        } else {
            self.store.update_order(order, expected).await?
        };
        order.version = version;
        metrics::counter!("order_status_transitions_total", "status" => order.status.as_str())
            .increment(1);
        Ok(())
    }

    async fn announce(&self, order: Order, previous: OrderStatus) -> StatusChange {
        let template = if order.status == OrderStatus::Cancelled {
            Template::Cancellation
        } else {
            Template::StatusChange
        };
        let email_delivered = self.notifier.email_owner(template, &order).await;
        self.notifier
            .raise(Notification::order_status(&order, order.status, Utc::now()))
            .await;

        StatusChange {
            order,
            previous,
            email_delivered,
        }
    }
}

#[cfg(test)]
mod tests {
    use domain::{PaymentMethod, PaymentStatus};
    use store::{NotificationStore, OrderStore};

    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::Fixture;

    async fn cash_order(fx: &Fixture) -> String {
        fx.checkout
            .orders
            .commit(fx.commit_request(PaymentMethod::Cash, 2))
            .await
            .unwrap()
            .order_id()
            .to_string()
    }

    #[tokio::test]
    async fn test_forward_path_to_delivered() {
        let fx = Fixture::new().await;
        let id = cash_order(&fx).await;
        let status = &fx.checkout.status;

        let change = status.set_status(&id, "SHIPPED").await.unwrap();
        assert_eq!(change.previous, OrderStatus::Completed);
        assert!(change.email_delivered);

        status.set_status(&id, "OUT_FOR_DELIVERY").await.unwrap();
        let change = status.set_status(&id, "DELIVERED").await.unwrap();
        assert_eq!(change.order.status, OrderStatus::Delivered);
        assert_eq!(change.order.payment_status, PaymentStatus::Paid);

        let stored = fx
            .store
            .get_order(change.order.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, OrderStatus::Delivered);
        assert_eq!(stored.version, change.order.version);

        // One confirmation plus three status emails
        let sent = fx.mailer.sent();
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[3].subject, "Order Status Change");
        assert!(sent[3].html.contains("DELIVERED"));

        let notes = fx.store.notifications_for(fx.user.id).await.unwrap();
        assert!(notes.iter().any(|n| n.title == "Order Update: DELIVERED"));
    }

    #[tokio::test]
    async fn test_invalid_targets_are_validation_errors() {
        let fx = Fixture::new().await;
        let id = cash_order(&fx).await;
        let status = &fx.checkout.status;

        for target in ["COMPLETED", "PENDING", "LOST"] {
            let err = status.set_status(&id, target).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "target {target}");
        }
    }

    #[tokio::test]
    async fn test_target_is_checked_before_order_lookup() {
        let fx = Fixture::new().await;
        let err = fx
            .checkout
            .status
            .set_status(&OrderId::new().to_string(), "COMPLETED")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = fx
            .checkout
            .status
            .set_status(&OrderId::new().to_string(), "SHIPPED")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_conflicting_transitions() {
        let fx = Fixture::new().await;
        let id = cash_order(&fx).await;
        let status = &fx.checkout.status;

        status.set_status(&id, "OUT_FOR_DELIVERY").await.unwrap();
        let err = status.set_status(&id, "OUT_FOR_DELIVERY").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        let err = status.set_status(&id, "SHIPPED").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        status.set_status(&id, "DELIVERED").await.unwrap();
        for target in ["CANCELLED", "SHIPPED", "DELIVERED"] {
            let err = status.set_status(&id, target).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Conflict, "target {target}");
        }
    }

    #[tokio::test]
    async fn test_unpaid_online_order_cannot_ship() {
        let fx = Fixture::new().await;
        let id = fx
            .checkout
            .orders
            .commit(fx.commit_request(PaymentMethod::Online, 1))
            .await
            .unwrap()
            .order_id()
            .to_string();

        let err = fx.checkout.status.set_status(&id, "SHIPPED").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        fx.checkout.status.set_status(&id, "CANCELLED").await.unwrap();
    }

    #[tokio::test]
    async fn test_admin_cancel_restores_stock() {
        let fx = Fixture::new().await;
        let id = cash_order(&fx).await;
        assert_eq!(fx.store.stock_of(fx.kettle.id).await, Some(8));

        let change = fx.checkout.status.set_status(&id, "cancelled").await.unwrap();
        assert!(change.order.is_cancelled);
        assert!(change.order.cancel_date.is_some());
        assert_eq!(fx.store.stock_of(fx.kettle.id).await, Some(10));
        assert_eq!(fx.mailer.sent().last().unwrap().subject, "Cancel Order");
    }

    #[tokio::test]
    async fn test_email_failure_keeps_new_status() {
        let fx = Fixture::new().await;
        let id = cash_order(&fx).await;
        fx.mailer.set_fail_on_send(true);

        let change = fx.checkout.status.set_status(&id, "SHIPPED").await.unwrap();
        assert!(!change.email_delivered);

        let stored = fx
            .store
            .get_order(change.order.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, OrderStatus::Shipped);
        let notes = fx.store.notifications_for(fx.user.id).await.unwrap();
        assert!(notes.iter().any(|n| n.title == "Order Update: SHIPPED"));
    }

    #[tokio::test]
    async fn test_customer_cancellation() {
        let fx = Fixture::new().await;
        let id = cash_order(&fx).await;
        let status = &fx.checkout.status;

        let err = status
            .cancel_by_user(UserId::new(), &id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let change = status.cancel_by_user(fx.user.id, &id).await.unwrap();
        assert_eq!(change.order.status, OrderStatus::Cancelled);
        assert_eq!(fx.store.stock_of(fx.kettle.id).await, Some(10));

        let err = status.cancel_by_user(fx.user.id, &id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }
}
