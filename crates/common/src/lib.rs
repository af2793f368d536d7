//! Shared types for the storefront backend.

mod money;
mod types;

pub use money::Money;
pub use types::{
    AddressId, BrandId, CategoryId, IdParseError, NotificationId, OrderId, ProductId, RatingId,
    UserId,
};
