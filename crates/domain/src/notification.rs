//! In-app notifications raised by order lifecycle changes.

use chrono::{DateTime, Utc};
use common::{NotificationId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::order::{Order, OrderStatus};

/// Audience of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationScope {
    /// Shown to every user.
    Public,
    /// Shown only to the owning user.
    Private,
}

impl NotificationScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationScope::Public => "PUBLIC",
            NotificationScope::Private => "PRIVATE",
        }
    }
}

impl std::str::FromStr for NotificationScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PUBLIC" => Ok(NotificationScope::Public),
            "PRIVATE" => Ok(NotificationScope::Private),
            other => Err(format!("unknown notification scope: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub description: String,
    pub scope: NotificationScope,
    /// Owner of a private notification; `None` for public ones.
    pub user_id: Option<UserId>,
    pub extra: Value,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// A private notice telling the owner their order moved to `status`.
    pub fn order_status(order: &Order, status: OrderStatus, now: DateTime<Utc>) -> Self {
        Self::private(
            order.user_id,
            format!("Order Update: {status}"),
            format!("Your order {} has been {status}", order.reference()),
            json!({ "order": order.id }),
            now,
        )
    }

    /// A private notice confirming a newly placed order.
    pub fn order_placed(order: &Order, now: DateTime<Utc>) -> Self {
        Self::private(
            order.user_id,
            "Order Placed".to_string(),
            format!(
                "Your order {} of {} has been placed successfully",
                order.reference(),
                order.payment_amount
            ),
            json!({ "order": order.id }),
            now,
        )
    }

    pub fn private(
        user_id: UserId,
        title: String,
        description: String,
        extra: Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            title,
            description,
            scope: NotificationScope::Private,
            user_id: Some(user_id),
            extra,
            created_at: now,
        }
    }

    pub fn public(title: String, description: String, now: DateTime<Utc>) -> Self {
        Self {
            id: NotificationId::new(),
            title,
            description,
            scope: NotificationScope::Public,
            user_id: None,
            extra: Value::Null,
            created_at: now,
        }
    }

    /// Returns true if `user_id` should see this notification.
    pub fn visible_to(&self, user_id: UserId) -> bool {
        match self.scope {
            NotificationScope::Public => true,
            NotificationScope::Private => self.user_id == Some(user_id),
        }
    }
}
