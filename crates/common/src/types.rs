use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Returned when a string cannot be parsed as one of the typed identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind} id: {value}")]
pub struct IdParseError {
    /// Human-readable name of the identifier type.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Declares a UUID-backed identifier newtype.
///
/// Every identifier in the system wraps a UUID so that ids of different
/// entities cannot be mixed up at compile time.
macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an id from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }

            /// Parses an id from its string form.
            pub fn parse(value: &str) -> Result<Self, IdParseError> {
                Uuid::parse_str(value.trim())
                    .map(Self)
                    .map_err(|_| IdParseError {
                        kind: $kind,
                        value: value.to_string(),
                    })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

typed_id!(
    /// Identifier of a storefront user (customer or admin).
    UserId,
    "user"
);
typed_id!(
    /// Identifier of a catalog product.
    ProductId,
    "product"
);
typed_id!(
    /// Identifier of a persisted order.
    OrderId,
    "order"
);
typed_id!(
    /// Identifier of a saved delivery address.
    AddressId,
    "address"
);
typed_id!(
    /// Identifier of a brand.
    BrandId,
    "brand"
);
typed_id!(
    /// Identifier of a category.
    CategoryId,
    "category"
);
typed_id!(
    /// Identifier of an in-app notification.
    NotificationId,
    "notification"
);
typed_id!(
    /// Identifier of a product rating.
    RatingId,
    "rating"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_unique_ids() {
        let id1 = OrderId::new();
        let id2 = OrderId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = ProductId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn parse_accepts_canonical_form() {
        let id = UserId::new();
        let parsed = UserId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_malformed_input() {
        let err = ProductId::parse("not-a-product").unwrap_err();
        assert_eq!(err.kind, "product");
        assert_eq!(err.value, "not-a-product");
        assert_eq!(err.to_string(), "Invalid product id: not-a-product");
    }

    #[test]
    fn serializes_as_bare_string() {
        let id = AddressId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
