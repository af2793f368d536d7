use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AddressId, BrandId, CategoryId, OrderId, ProductId, UserId};
use domain::{
    Address, Brand, CartLine, CatalogRecords, Category, Notification, Order, OrderStatus,
    PaymentStatus, Product, ProductFilter, Rating, User,
};
use tokio::sync::RwLock;

use crate::{
    OrderQuery, Result, StoreError,
    store::{
        AddressStore, CartStore, CatalogStore, NotificationStore, OrderStore, RatingStore,
        SeedStore, UserStore, merge_stock_requests,
    },
};

#[derive(Default)]
struct State {
    products: HashMap<ProductId, Product>,
    brands: HashMap<BrandId, Brand>,
    categories: HashMap<CategoryId, Category>,
    ratings: Vec<Rating>,
    users: HashMap<UserId, User>,
    addresses: HashMap<AddressId, Address>,
    cart: Vec<CartLine>,
    orders: HashMap<OrderId, Order>,
    notifications: Vec<Notification>,
}

impl State {
    fn restore_stock(&mut self, order: &Order) {
        for (product_id, quantity) in order.stock_requests() {
            if let Some(product) = self.products.get_mut(&product_id) {
                product.stock += quantity;
            }
        }
    }

    fn check_version(&self, order_id: OrderId, expected: i64) -> Result<()> {
        let stored = self
            .orders
            .get(&order_id)
            .ok_or_else(|| StoreError::not_found("Order", order_id))?;
        if stored.version != expected {
            return Err(StoreError::ConcurrencyConflict {
                order_id,
                expected,
                actual: stored.version,
            });
        }
        Ok(())
    }

    fn write_order(&mut self, order: &Order, expected: i64) -> i64 {
        let mut stored = order.clone();
        stored.version = expected + 1;
        self.orders.insert(stored.id, stored);
        expected + 1
    }
}

/// In-memory store implementation for development and testing.
///
/// All data lives behind a single lock, so every multi-record operation is
/// atomic just like its transactional PostgreSQL counterpart.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a product's current stock, if the product exists.
    pub async fn stock_of(&self, product_id: ProductId) -> Option<u32> {
        self.state
            .read()
            .await
            .products
            .get(&product_id)
            .map(|p| p.stock)
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Clears all data.
    pub async fn clear(&self) {
        *self.state.write().await = State::default();
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn catalog_records(&self, filter: &ProductFilter) -> Result<CatalogRecords> {
        let state = self.state.read().await;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let brands = products
            .iter()
            .filter_map(|p| p.brand_id)
            .filter_map(|id| state.brands.get(&id).cloned())
            .collect();
        let categories = state
            .categories
            .values()
            .filter(|c| products.iter().any(|p| p.category_ids.contains(&c.id)))
            .cloned()
            .collect();
        let ratings = state
            .ratings
            .iter()
            .filter(|r| products.iter().any(|p| p.id == r.product_id))
            .cloned()
            .collect();

        Ok(CatalogRecords {
            products,
            brands,
            categories,
            ratings,
        })
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn add_or_increment(
        &self,
        user_id: UserId,
        product_id: ProductId,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let mut state = self.state.write().await;
        match state
            .cart
            .iter_mut()
            .find(|l| l.user_id == user_id && l.product_id == product_id)
        {
            Some(line) => {
                line.quantity += 1;
                line.updated_at = now;
            }
            None => state.cart.push(CartLine::new(user_id, product_id, now)),
        }
        Ok(state.cart.iter().filter(|l| l.user_id == user_id).count())
    }

    async fn cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>> {
        let state = self.state.read().await;
        Ok(state
            .cart
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let index = state
            .cart
            .iter()
            .position(|l| l.user_id == user_id && l.product_id == product_id)
            .ok_or_else(|| StoreError::not_found("Cart line", product_id))?;

        if quantity == 0 {
            state.cart.remove(index);
        } else {
            let line = &mut state.cart[index];
            line.quantity = quantity;
            line.updated_at = now;
        }
        Ok(())
    }

    async fn remove_line(&self, user_id: UserId, product_id: ProductId) -> Result<()> {
        let mut state = self.state.write().await;
        let before = state.cart.len();
        state
            .cart
            .retain(|l| !(l.user_id == user_id && l.product_id == product_id));
        if state.cart.len() == before {
            return Err(StoreError::not_found("Cart line", product_id));
        }
        Ok(())
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<usize> {
        let mut state = self.state.write().await;
        let before = state.cart.len();
        state.cart.retain(|l| l.user_id != user_id);
        Ok(before - state.cart.len())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn place_order(&self, order: &Order) -> Result<()> {
        let mut state = self.state.write().await;

        if let Some(ref key) = order.idempotency_key
            && state.orders.values().any(|o| {
                o.user_id == order.user_id && o.idempotency_key.as_deref() == Some(key)
            })
        {
            return Err(StoreError::DuplicateIdempotencyKey { key: key.clone() });
        }

        let requests = merge_stock_requests(order.stock_requests());

        // Check every line before touching any stock
        for (product_id, quantity) in &requests {
            let available = state.products.get(product_id).map_or(0, |p| p.stock);
            if available < *quantity {
                return Err(StoreError::InsufficientStock {
                    product_id: *product_id,
                });
            }
        }
        for (product_id, quantity) in &requests {
            if let Some(product) = state.products.get_mut(product_id) {
                product.stock -= quantity;
            }
        }

        state.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&order_id).cloned())
    }

    async fn find_by_gateway_order_id(&self, gateway_order_id: &str) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .find(|o| o.gateway_order_id.as_deref() == Some(gateway_order_id))
            .cloned())
    }

    async fn find_by_idempotency_key(
        &self,
        user_id: UserId,
        key: &str,
    ) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .find(|o| o.user_id == user_id && o.idempotency_key.as_deref() == Some(key))
            .cloned())
    }

    async fn update_order(&self, order: &Order, expected_version: i64) -> Result<i64> {
        let mut state = self.state.write().await;
        state.check_version(order.id, expected_version)?;
        Ok(state.write_order(order, expected_version))
    }

    async fn update_order_restoring_stock(
        &self,
        order: &Order,
        expected_version: i64,
    ) -> Result<i64> {
        let mut state = self.state.write().await;
        state.check_version(order.id, expected_version)?;
        state.restore_stock(order);
        Ok(state.write_order(order, expected_version))
    }

    async fn discard_order(&self, order_id: OrderId) -> Result<bool> {
        let mut state = self.state.write().await;
        if !state.orders.get(&order_id).is_some_and(Order::awaits_payment) {
            return Ok(false);
        }
        match state.orders.remove(&order_id) {
            Some(order) => {
                state.restore_stock(&order);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| {
                if let Some(user_id) = query.user_id
                    && o.user_id != user_id
                {
                    return false;
                }
                query.matches_status(o.status)
            })
            .cloned()
            .collect();

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let offset = query.offset.unwrap_or(0);
        let orders = orders.into_iter().skip(offset);
        Ok(match query.limit {
            Some(limit) => orders.take(limit).collect(),
            None => orders.collect(),
        })
    }

    async fn expire_pending_orders(&self, now: DateTime<Utc>) -> Result<Vec<Order>> {
        let mut state = self.state.write().await;
        let expired: Vec<OrderId> = state
            .orders
            .values()
            .filter(|o| {
                o.status == OrderStatus::Pending
                    && o.payment_status == PaymentStatus::Pending
                    && o.expires_at.is_some_and(|deadline| deadline <= now)
            })
            .map(|o| o.id)
            .collect();

        let mut removed = Vec::with_capacity(expired.len());
        for order_id in expired {
            if let Some(order) = state.orders.remove(&order_id) {
                state.restore_stock(&order);
                removed.push(order);
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl AddressStore for InMemoryStore {
    async fn find_owned_address(
        &self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<Option<Address>> {
        let state = self.state.read().await;
        Ok(state
            .addresses
            .get(&address_id)
            .filter(|a| a.user_id == user_id)
            .cloned())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_user(&self, user_id: UserId) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }
}

#[async_trait]
impl NotificationStore for InMemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        self.state
            .write()
            .await
            .notifications
            .push(notification.clone());
        Ok(())
    }

    async fn notifications_for(&self, user_id: UserId) -> Result<Vec<Notification>> {
        let state = self.state.read().await;
        let mut notifications: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|n| n.visible_to(user_id))
            .cloned()
            .collect();
        // Stable sort keeps later inserts first among equal timestamps
        notifications.reverse();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }
}

#[async_trait]
impl RatingStore for InMemoryStore {
    async fn insert_rating(&self, rating: &Rating) -> Result<()> {
        self.state.write().await.ratings.push(rating.clone());
        Ok(())
    }

    async fn has_delivered_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.orders.values().any(|o| {
            o.user_id == user_id
                && o.status == OrderStatus::Delivered
                && o.lines.iter().any(|l| l.product_id == product_id)
        }))
    }
}

#[async_trait]
impl SeedStore for InMemoryStore {
    async fn upsert_product(&self, product: &Product) -> Result<()> {
        self.state
            .write()
            .await
            .products
            .insert(product.id, product.clone());
        Ok(())
    }

    async fn insert_brand(&self, brand: &Brand) -> Result<()> {
        self.state
            .write()
            .await
            .brands
            .insert(brand.id, brand.clone());
        Ok(())
    }

    async fn insert_category(&self, category: &Category) -> Result<()> {
        self.state
            .write()
            .await
            .categories
            .insert(category.id, category.clone());
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        self.state.write().await.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn insert_address(&self, address: &Address) -> Result<()> {
        self.state
            .write()
            .await
            .addresses
            .insert(address.id, address.clone());
        Ok(())
    }
}
