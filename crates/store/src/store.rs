use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AddressId, OrderId, ProductId, UserId};
use domain::{
    Address, Brand, CartLine, CatalogRecords, Category, Notification, Order, Product,
    ProductFilter, Rating, User,
};

use crate::{OrderQuery, Result};

/// Read access to catalog records.
///
/// Catalog management lives outside this system; the only writes here are
/// the stock adjustments performed inside [`OrderStore`] operations.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Returns the products matching `filter` (newest first) together with
    /// the brands, categories and ratings they reference.
    async fn catalog_records(&self, filter: &ProductFilter) -> Result<CatalogRecords>;
}

/// Per-user shopping carts.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Adds a line with quantity 1, or increments an existing line by 1.
    ///
    /// Returns the number of distinct lines in the cart afterwards.
    async fn add_or_increment(
        &self,
        user_id: UserId,
        product_id: ProductId,
        now: DateTime<Utc>,
    ) -> Result<usize>;

    /// Returns the user's lines in insertion order.
    async fn cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>>;

    /// Sets a line's quantity; 0 deletes the line.
    ///
    /// Fails with `NotFound` if the line does not exist.
    async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<()>;

    /// Deletes a line. Fails with `NotFound` if the line does not exist.
    async fn remove_line(&self, user_id: UserId, product_id: ProductId) -> Result<()>;

    /// Deletes every line of the user's cart, returning how many were removed.
    async fn clear_cart(&self, user_id: UserId) -> Result<usize>;
}

/// Order persistence with atomic stock bookkeeping.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Decrements stock for every line and inserts the order, atomically.
    ///
    /// Each decrement only succeeds if the product has at least the ordered
    /// quantity in stock. If any decrement fails the whole operation fails
    /// with `InsufficientStock` and nothing is persisted. Fails with
    /// `DuplicateIdempotencyKey` if the user already has an order with the
    /// same idempotency key.
    async fn place_order(&self, order: &Order) -> Result<()>;

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    async fn find_by_gateway_order_id(&self, gateway_order_id: &str) -> Result<Option<Order>>;

    async fn find_by_idempotency_key(&self, user_id: UserId, key: &str)
    -> Result<Option<Order>>;

    /// Writes the order's mutable fields if the stored version equals
    /// `expected_version`, returning the new version.
    ///
    /// Fails with `ConcurrencyConflict` on a version mismatch and `NotFound`
    /// if the order no longer exists.
    async fn update_order(&self, order: &Order, expected_version: i64) -> Result<i64>;

    /// Like [`OrderStore::update_order`], additionally restoring the stock of
    /// every line in the same atomic operation. Used for cancellation.
    async fn update_order_restoring_stock(
        &self,
        order: &Order,
        expected_version: i64,
    ) -> Result<i64>;

    /// Deletes an order that still awaits payment and restores its stock.
    ///
    /// Returns false, touching nothing, if the order does not exist or has
    /// already been paid, cancelled or otherwise moved on.
    async fn discard_order(&self, order_id: OrderId) -> Result<bool>;

    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>>;

    /// Deletes every unpaid online order whose payment deadline is at or
    /// before `now` and restores its stock, in one atomic operation.
    ///
    /// Returns the removed orders.
    async fn expire_pending_orders(&self, now: DateTime<Utc>) -> Result<Vec<Order>>;
}

/// Saved delivery addresses (managed elsewhere, read here).
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Returns the address only if it belongs to `user_id`.
    async fn find_owned_address(
        &self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<Option<Address>>;
}

/// Registered users (managed elsewhere, read here).
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, user_id: UserId) -> Result<Option<User>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> Result<()>;

    /// Returns the user's private notifications plus all public ones,
    /// newest first.
    async fn notifications_for(&self, user_id: UserId) -> Result<Vec<Notification>>;
}

#[async_trait]
pub trait RatingStore: Send + Sync {
    async fn insert_rating(&self, rating: &Rating) -> Result<()>;

    /// Returns true if the user has a delivered order containing the product.
    async fn has_delivered_product(&self, user_id: UserId, product_id: ProductId)
    -> Result<bool>;
}

/// Writes for records owned by external management services.
///
/// Used to seed development data and test fixtures.
#[async_trait]
pub trait SeedStore: Send + Sync {
    /// Inserts a product, replacing any existing product with the same id.
    async fn upsert_product(&self, product: &Product) -> Result<()>;

    async fn insert_brand(&self, brand: &Brand) -> Result<()>;

    async fn insert_category(&self, category: &Category) -> Result<()>;

    async fn insert_user(&self, user: &User) -> Result<()>;

    async fn insert_address(&self, address: &Address) -> Result<()>;
}

/// Everything the checkout services need from persistence.
pub trait Store:
    CatalogStore
    + CartStore
    + OrderStore
    + AddressStore
    + UserStore
    + NotificationStore
    + RatingStore
    + SeedStore
{
}

// Blanket implementation for every type providing all ports
impl<T> Store for T where
    T: CatalogStore
        + CartStore
        + OrderStore
        + AddressStore
        + UserStore
        + NotificationStore
        + RatingStore
        + SeedStore
{
}

/// Sums quantities per product so repeated lines are checked as one request.
pub fn merge_stock_requests(
    requests: impl IntoIterator<Item = (ProductId, u32)>,
) -> Vec<(ProductId, u32)> {
    let mut merged: Vec<(ProductId, u32)> = Vec::new();
    for (product_id, quantity) in requests {
        match merged.iter_mut().find(|(id, _)| *id == product_id) {
            Some((_, total)) => *total += quantity,
            None => merged.push((product_id, quantity)),
        }
    }
    // Fixed lock order across concurrent commits
    merged.sort_by_key(|(id, _)| *id);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_stock_requests_sums_duplicates() {
        let a = ProductId::new();
        let b = ProductId::new();
        let merged = merge_stock_requests([(a, 2), (b, 1), (a, 3)]);
        assert_eq!(merged.len(), 2);
        assert!(merged.contains(&(a, 5)));
        assert!(merged.contains(&(b, 1)));
    }

    #[test]
    fn test_merge_stock_requests_is_sorted() {
        let ids: Vec<ProductId> = (0..5).map(|_| ProductId::new()).collect();
        let merged = merge_stock_requests(ids.iter().map(|id| (*id, 1)));
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(merged.iter().map(|(id, _)| *id).collect::<Vec<_>>(), sorted);
    }
}
