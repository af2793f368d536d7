//! Customer-owned records the order core reads but does not manage.

use chrono::{DateTime, Utc};
use common::{AddressId, UserId};
use serde::{Deserialize, Serialize};

use crate::order::ShippingAddress;

/// Role carried by an authenticated requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// A registered storefront user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
}

impl User {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            email: email.into(),
            phone: None,
            role: Role::User,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

/// A saved delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub full_name: String,
    pub phone: String,
    pub alternate_phone: Option<String>,
    pub state: String,
    pub city: String,
    pub address: String,
    pub pincode: String,
    pub address_type: String,
    pub created_at: DateTime<Utc>,
}

impl Address {
    /// Copies the delivery fields into an immutable order snapshot.
    pub fn snapshot(&self) -> ShippingAddress {
        ShippingAddress {
            full_name: self.full_name.clone(),
            phone: self.phone.clone(),
            alternate_phone: self.alternate_phone.clone(),
            state: self.state.clone(),
            city: self.city.clone(),
            address: self.address.clone(),
            pincode: self.pincode.clone(),
            address_type: self.address_type.clone(),
        }
    }
}
