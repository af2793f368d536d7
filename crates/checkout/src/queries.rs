//! Read side: order listings with customer and product joins, notifications.

use std::collections::{HashMap, HashSet};

use common::{OrderId, ProductId, UserId};
use domain::{Notification, Order, OrderLine, OrderStatus, ProductView, User};
use serde::Serialize;
use store::{OrderQuery, Store};
use tracing::instrument;

use crate::catalog::Catalog;
use crate::error::{CheckoutError, Result};

/// Owner details shown alongside an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<User> for Customer {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            email: user.email,
            phone: user.phone,
        }
    }
}

/// An order line with the product's current catalog view.
///
/// The snapshot is always kept; `available` is false once the product has
/// been deactivated or removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(flatten)]
    pub line: OrderLine,
    pub product: Option<ProductView>,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
    pub items: Vec<OrderItem>,
}

#[derive(Clone)]
pub struct OrderQueries<S> {
    store: S,
    catalog: Catalog<S>,
}

impl<S: Store + Clone> OrderQueries<S> {
    pub fn new(store: S) -> Self {
        Self {
            catalog: Catalog::new(store.clone()),
            store,
        }
    }

    /// Every order that has left `PENDING`, with its owner, newest first.
    #[instrument(skip(self))]
    pub async fn admin_orders(&self) -> Result<Vec<OrderDetails>> {
        let orders = self
            .store
            .list_orders(&OrderQuery::new().excluding(OrderStatus::Pending))
            .await?;

        let owners: HashSet<UserId> = orders.iter().map(|o| o.user_id).collect();
        let mut customers = HashMap::with_capacity(owners.len());
        for user_id in owners {
            if let Some(user) = self.store.find_user(user_id).await? {
                customers.insert(user_id, Customer::from(user));
            }
        }

        self.join(orders, |order| customers.get(&order.user_id).cloned())
            .await
    }

    /// The requester's orders, newest first.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn user_orders(&self, user_id: UserId) -> Result<Vec<OrderDetails>> {
        let orders = self.store.list_orders(&OrderQuery::for_user(user_id)).await?;
        self.join(orders, |_| None).await
    }

    /// One of the requester's orders.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn user_order(&self, user_id: UserId, order_id: &str) -> Result<OrderDetails> {
        let order_id = OrderId::parse(order_id)?;
        let order = self
            .store
            .get_order(order_id)
            .await?
            .filter(|o| o.is_owned_by(user_id))
            .ok_or_else(|| CheckoutError::not_found("Order"))?;

        let mut joined = self.join(vec![order], |_| None).await?;
        joined
            .pop()
            .ok_or_else(|| CheckoutError::not_found("Order"))
    }

    /// The requester's private notifications plus public ones, newest first.
    pub async fn notifications(&self, user_id: UserId) -> Result<Vec<Notification>> {
        Ok(self.store.notifications_for(user_id).await?)
    }

    async fn join(
        &self,
        orders: Vec<Order>,
        customer: impl Fn(&Order) -> Option<Customer>,
    ) -> Result<Vec<OrderDetails>> {
        let product_ids: HashSet<ProductId> = orders
            .iter()
            .flat_map(|o| o.lines.iter().map(|l| l.product_id))
            .collect();
        let views = self.catalog.views_by_id(product_ids).await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = order
                    .lines
                    .iter()
                    .map(|line| {
                        let product = views.get(&line.product_id).cloned();
                        OrderItem {
                            available: product.as_ref().is_some_and(|p| p.is_active),
                            line: line.clone(),
                            product,
                        }
                    })
                    .collect();
                OrderDetails {
                    customer: customer(&order),
                    order,
                    items,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use domain::PaymentMethod;

    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::Fixture;

    #[tokio::test]
    async fn test_admin_listing_excludes_pending_and_joins_owner() {
        let fx = Fixture::new().await;
        let cash = fx
            .checkout
            .orders
            .commit(fx.commit_request(PaymentMethod::Cash, 1))
            .await
            .unwrap()
            .order_id();
        fx.checkout
            .orders
            .commit(fx.commit_request(PaymentMethod::Online, 1))
            .await
            .unwrap();

        let listed = fx.checkout.queries.admin_orders().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].order.id, cash);
        assert_eq!(
            listed[0].customer.as_ref().map(|c| c.email.as_str()),
            Some("asha@example.com")
        );
        assert_eq!(listed[0].items.len(), 1);
        assert!(listed[0].items[0].available);
    }

    #[tokio::test]
    async fn test_user_listing_marks_removed_products_unavailable() {
        let fx = Fixture::new().await;
        fx.checkout
            .orders
            .commit(fx.commit_request(PaymentMethod::Cash, 1))
            .await
            .unwrap();
        fx.set_active(fx.kettle.id, false).await;

        let listed = fx.checkout.queries.user_orders(fx.user.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        let item = &listed[0].items[0];
        assert!(!item.available);
        assert_eq!(item.line.product_name, "Kettle");
        assert!(listed[0].customer.is_none());

        assert!(
            fx.checkout
                .queries
                .user_orders(UserId::new())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_user_order_is_scoped_to_owner() {
        let fx = Fixture::new().await;
        let id = fx
            .checkout
            .orders
            .commit(fx.commit_request(PaymentMethod::Cash, 1))
            .await
            .unwrap()
            .order_id()
            .to_string();

        let details = fx.checkout.queries.user_order(fx.user.id, &id).await.unwrap();
        assert_eq!(details.order.id.to_string(), id);

        let err = fx
            .checkout
            .queries
            .user_order(UserId::new(), &id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = fx
            .checkout
            .queries
            .user_order(fx.user.id, "nope")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_item_serializes_flat() {
        let item = OrderItem {
            line: OrderLine {
                product_id: ProductId::new(),
                product_name: "Kettle".to_string(),
                order_product_price: common::Money::from_major(100),
                list_price: common::Money::from_major(120),
                quantity: 2,
            },
            product: None,
            available: false,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["productName"], "Kettle");
        assert_eq!(json["quantity"], 2);
        assert_eq!(json["available"], false);
    }
}
