//! Persistence for the storefront order core.
//!
//! The checkout services talk to storage only through the port traits in
//! [`store`]; [`InMemoryStore`] backs development and tests, and
//! [`PostgresStore`] backs production.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::OrderQuery;
pub use store::{
    AddressStore, CartStore, CatalogStore, NotificationStore, OrderStore, RatingStore, SeedStore,
    Store, UserStore,
};
