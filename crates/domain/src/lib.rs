//! Domain layer for the storefront order core.
//!
//! This crate holds the pure, storage-free parts of the system:
//! - Catalog records and the product view builder
//! - Cart lines and cart pricing
//! - Order quotes, the persisted order record and the status state machine
//! - In-app notifications

pub mod cart;
pub mod catalog;
pub mod customer;
pub mod error;
pub mod notification;
pub mod order;

pub use cart::{CartLine, CartLineView, CartSummary, summarize};
pub use catalog::{
    Brand, CatalogRecords, Category, Product, ProductFilter, ProductImage, ProductView, Rating,
    build_views, rating_summary,
};
pub use customer::{Address, Role, User};
pub use error::DomainError;
pub use notification::{Notification, NotificationScope};
pub use order::{
    DEFAULT_DELIVERY_DAYS, GeoPoint, NewOrder, Order, OrderError, OrderLine, OrderStatus,
    OrderTotals, PaymentMethod, PaymentOutcome, PaymentStatus, Quote, ResolvedLine,
    ShippingAddress,
};
