use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    AddressId, BrandId, CategoryId, Money, NotificationId, OrderId, ProductId, RatingId, UserId,
};
use domain::{
    Address, Brand, CartLine, CatalogRecords, Category, GeoPoint, Notification, Order,
    OrderLine, Product, ProductFilter, ProductImage, Rating, Role, ShippingAddress, User,
};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    OrderQuery, Result, StoreError,
    store::{
        AddressStore, CartStore, CatalogStore, NotificationStore, OrderStore, RatingStore,
        SeedStore, UserStore, merge_stock_requests,
    },
};

const ORDER_COLUMNS: &str = "id, order_code, user_id, lines, total_amount, discount_amount, \
    payment_amount, status, payment_status, method, gateway_order_id, gateway_payment_id, \
    address, is_cancelled, cancel_date, date, delivery_date, latitude, longitude, expires_at, \
    idempotency_key, version, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "id, name, description, price, list_price, stock, is_active, \
    brand_id, category_ids, images, created_at, updated_at";

const IDEMPOTENCY_INDEX: &str = "orders_user_idempotency_key_idx";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        let category_ids: Vec<Uuid> = row.try_get("category_ids")?;
        let images: Json<Vec<ProductImage>> = row.try_get("images")?;
        Ok(Product {
            id: ProductId::from_uuid(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_minor(row.try_get("price")?),
            list_price: Money::from_minor(row.try_get("list_price")?),
            stock: to_u32(row.try_get("stock")?, "stock")?,
            is_active: row.try_get("is_active")?,
            brand_id: row
                .try_get::<Option<Uuid>, _>("brand_id")?
                .map(BrandId::from_uuid),
            category_ids: category_ids.into_iter().map(CategoryId::from_uuid).collect(),
            images: images.0,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        let lines: Json<Vec<OrderLine>> = row.try_get("lines")?;
        let address: Json<ShippingAddress> = row.try_get("address")?;
        let latitude: Option<f64> = row.try_get("latitude")?;
        let longitude: Option<f64> = row.try_get("longitude")?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get("id")?),
            order_code: row.try_get("order_code")?,
            user_id: UserId::from_uuid(row.try_get("user_id")?),
            lines: lines.0,
            total_amount: Money::from_minor(row.try_get("total_amount")?),
            discount_amount: Money::from_minor(row.try_get("discount_amount")?),
            payment_amount: Money::from_minor(row.try_get("payment_amount")?),
            status: decode(row.try_get::<String, _>("status")?)?,
            payment_status: decode(row.try_get::<String, _>("payment_status")?)?,
            method: decode(row.try_get::<String, _>("method")?)?,
            gateway_order_id: row.try_get("gateway_order_id")?,
            gateway_payment_id: row.try_get("gateway_payment_id")?,
            address: address.0,
            is_cancelled: row.try_get("is_cancelled")?,
            cancel_date: row.try_get("cancel_date")?,
            date: row.try_get("date")?,
            delivery_date: row.try_get("delivery_date")?,
            location: latitude
                .zip(longitude)
                .map(|(latitude, longitude)| GeoPoint {
                    latitude,
                    longitude,
                }),
            expires_at: row.try_get("expires_at")?,
            idempotency_key: row.try_get("idempotency_key")?,
            version: row.try_get("version")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_notification(row: &PgRow) -> Result<Notification> {
        Ok(Notification {
            id: NotificationId::from_uuid(row.try_get("id")?),
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            scope: row
                .try_get::<String, _>("scope")?
                .parse()
                .map_err(StoreError::Decode)?,
            user_id: row
                .try_get::<Option<Uuid>, _>("user_id")?
                .map(UserId::from_uuid),
            extra: row.try_get("extra")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_rating(row: &PgRow) -> Result<Rating> {
        let star: i16 = row.try_get("star")?;
        Ok(Rating {
            id: RatingId::from_uuid(row.try_get("id")?),
            user_id: UserId::from_uuid(row.try_get("user_id")?),
            product_id: ProductId::from_uuid(row.try_get("product_id")?),
            star: u8::try_from(star)
                .map_err(|_| StoreError::Decode(format!("invalid star value {star}")))?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
        })
    }

    /// Writes the mutable order fields under a version check.
    async fn write_order(
        conn: &mut PgConnection,
        order: &Order,
        expected_version: i64,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET order_code = $2, status = $3, payment_status = $4, gateway_order_id = $5,
                gateway_payment_id = $6, is_cancelled = $7, cancel_date = $8, expires_at = $9,
                updated_at = $10, version = version + 1
            WHERE id = $1 AND version = $11
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.order_code)
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(&order.gateway_order_id)
        .bind(&order.gateway_payment_id)
        .bind(order.is_cancelled)
        .bind(order.cancel_date)
        .bind(order.expires_at)
        .bind(order.updated_at)
        .bind(expected_version)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
                .bind(order.id.as_uuid())
                .fetch_optional(&mut *conn)
                .await?;
            return Err(match actual {
                Some(actual) => StoreError::ConcurrencyConflict {
                    order_id: order.id,
                    expected: expected_version,
                    actual,
                },
                None => StoreError::not_found("Order", order.id),
            });
        }

        Ok(expected_version + 1)
    }

    async fn restore_stock(conn: &mut PgConnection, order: &Order) -> Result<()> {
        for (product_id, quantity) in merge_stock_requests(order.stock_requests()) {
            sqlx::query("UPDATE products SET stock = stock + $1 WHERE id = $2")
                .bind(i64::from(quantity))
                .bind(product_id.as_uuid())
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }
}

fn to_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::Decode(format!("invalid {field} value {value}")))
}

fn decode<T>(value: String) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| StoreError::Decode(e.to_string()))
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn catalog_records(&self, filter: &ProductFilter) -> Result<CatalogRecords> {
        let mut sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1=1");
        let mut param_count = 0;

        // Build dynamic query
        if filter.ids.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND id = ANY(${param_count})"));
        }
        if filter.active_only {
            sql.push_str(" AND is_active = TRUE");
        }
        if filter.brand.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND brand_id = ${param_count}"));
        }
        if filter.category.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND ${param_count} = ANY(category_ids)"));
        }
        sql.push_str(" ORDER BY created_at DESC, id ASC");

        let mut query = sqlx::query(&sql);
        if let Some(ref ids) = filter.ids {
            query = query.bind(ids.iter().map(ProductId::as_uuid).collect::<Vec<Uuid>>());
        }
        if let Some(brand) = filter.brand {
            query = query.bind(brand.as_uuid());
        }
        if let Some(category) = filter.category {
            query = query.bind(category.as_uuid());
        }

        let rows = query.fetch_all(&self.pool).await?;
        let products = rows
            .iter()
            .map(Self::row_to_product)
            .collect::<Result<Vec<_>>>()?;

        let product_ids: Vec<Uuid> = products.iter().map(|p| p.id.as_uuid()).collect();
        let brand_ids: Vec<Uuid> = products
            .iter()
            .filter_map(|p| p.brand_id.map(|b| b.as_uuid()))
            .collect();
        let category_ids: Vec<Uuid> = products
            .iter()
            .flat_map(|p| p.category_ids.iter().map(CategoryId::as_uuid))
            .collect();

        let brands = sqlx::query("SELECT id, name, icon FROM brands WHERE id = ANY($1)")
            .bind(&brand_ids)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| -> Result<Brand> {
                Ok(Brand {
                    id: BrandId::from_uuid(row.try_get("id")?),
                    name: row.try_get("name")?,
                    icon: row.try_get("icon")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let categories = sqlx::query("SELECT id, name, icon FROM categories WHERE id = ANY($1)")
            .bind(&category_ids)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| -> Result<Category> {
                Ok(Category {
                    id: CategoryId::from_uuid(row.try_get("id")?),
                    name: row.try_get("name")?,
                    icon: row.try_get("icon")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let ratings = sqlx::query(
            "SELECT id, user_id, product_id, star, description, created_at FROM ratings WHERE product_id = ANY($1)",
        )
        .bind(&product_ids)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(Self::row_to_rating)
        .collect::<Result<Vec<_>>>()?;

        Ok(CatalogRecords {
            products,
            brands,
            categories,
            ratings,
        })
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    async fn add_or_increment(
        &self,
        user_id: UserId,
        product_id: ProductId,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO cart_lines (user_id, product_id, quantity, created_at, updated_at)
            VALUES ($1, $2, 1, $3, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = cart_lines.quantity + 1, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(product_id.as_uuid())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_lines WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(count as usize)
    }

    async fn cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, product_id, quantity, created_at, updated_at
            FROM cart_lines
            WHERE user_id = $1
            ORDER BY created_at ASC, product_id ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<CartLine> {
                Ok(CartLine {
                    user_id: UserId::from_uuid(row.try_get("user_id")?),
                    product_id: ProductId::from_uuid(row.try_get("product_id")?),
                    quantity: to_u32(row.try_get("quantity")?, "quantity")?,
                    created_at: row.try_get("created_at")?,
                    updated_at: row.try_get("updated_at")?,
                })
            })
            .collect()
    }

    async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let result = if quantity == 0 {
            sqlx::query("DELETE FROM cart_lines WHERE user_id = $1 AND product_id = $2")
                .bind(user_id.as_uuid())
                .bind(product_id.as_uuid())
                .execute(&self.pool)
                .await?
        } else {
            sqlx::query(
                "UPDATE cart_lines SET quantity = $3, updated_at = $4 WHERE user_id = $1 AND product_id = $2",
            )
            .bind(user_id.as_uuid())
            .bind(product_id.as_uuid())
            .bind(i64::from(quantity))
            .bind(now)
            .execute(&self.pool)
            .await?
        };

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Cart line", product_id));
        }
        Ok(())
    }

    async fn remove_line(&self, user_id: UserId, product_id: ProductId) -> Result<()> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE user_id = $1 AND product_id = $2")
            .bind(user_id.as_uuid())
            .bind(product_id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Cart line", product_id));
        }
        Ok(())
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<usize> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as usize)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn place_order(&self, order: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for (product_id, quantity) in merge_stock_requests(order.stock_requests()) {
            let result = sqlx::query(
                "UPDATE products SET stock = stock - $1, updated_at = NOW() WHERE id = $2 AND stock >= $1",
            )
            .bind(i64::from(quantity))
            .bind(product_id.as_uuid())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Dropping the transaction rolls back earlier decrements
                return Err(StoreError::InsufficientStock { product_id });
            }
        }

        let (latitude, longitude) = order
            .location
            .map_or((None, None), |p| (Some(p.latitude), Some(p.longitude)));

        sqlx::query(&format!(
            r#"
            INSERT INTO orders ({ORDER_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24)
            "#
        ))
        .bind(order.id.as_uuid())
        .bind(&order.order_code)
        .bind(order.user_id.as_uuid())
        .bind(Json(&order.lines))
        .bind(order.total_amount.minor_units())
        .bind(order.discount_amount.minor_units())
        .bind(order.payment_amount.minor_units())
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.method.as_str())
        .bind(&order.gateway_order_id)
        .bind(&order.gateway_payment_id)
        .bind(Json(&order.address))
        .bind(order.is_cancelled)
        .bind(order.cancel_date)
        .bind(order.date)
        .bind(order.delivery_date)
        .bind(latitude)
        .bind(longitude)
        .bind(order.expires_at)
        .bind(&order.idempotency_key)
        .bind(order.version)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            // Unique index violation means a retried commit
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some(IDEMPOTENCY_INDEX)
            {
                return StoreError::DuplicateIdempotencyKey {
                    key: order.idempotency_key.clone().unwrap_or_default(),
                };
            }
            StoreError::Database(e)
        })?;

        tx.commit().await?;
        tracing::debug!(order_id = %order.id, "order placed");
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_order).transpose()
    }

    async fn find_by_gateway_order_id(&self, gateway_order_id: &str) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE gateway_order_id = $1"
        ))
        .bind(gateway_order_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_order).transpose()
    }

    async fn find_by_idempotency_key(
        &self,
        user_id: UserId,
        key: &str,
    ) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 AND idempotency_key = $2"
        ))
        .bind(user_id.as_uuid())
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_order).transpose()
    }

    async fn update_order(&self, order: &Order, expected_version: i64) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        Self::write_order(&mut conn, order, expected_version).await
    }

    async fn update_order_restoring_stock(
        &self,
        order: &Order,
        expected_version: i64,
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;
        let version = Self::write_order(&mut tx, order, expected_version).await?;
        Self::restore_stock(&mut tx, order).await?;
        tx.commit().await?;
        Ok(version)
    }

    async fn discard_order(&self, order_id: OrderId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!(
            r#"
            DELETE FROM orders
            WHERE id = $1 AND status = 'PENDING' AND payment_status = 'PENDING'
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(false);
        };
        let order = Self::row_to_order(&row)?;
        Self::restore_stock(&mut tx, &order).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        let mut sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1=1");
        let mut param_count = 0;

        if query.user_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND user_id = ${param_count}"));
        }
        if query.statuses.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ANY(${param_count})"));
        }
        if !query.exclude_statuses.is_empty() {
            param_count += 1;
            sql.push_str(&format!(" AND NOT (status = ANY(${param_count}))"));
        }

        sql.push_str(" ORDER BY created_at DESC, id ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);
        if let Some(user_id) = query.user_id {
            sqlx_query = sqlx_query.bind(user_id.as_uuid());
        }
        if let Some(ref statuses) = query.statuses {
            sqlx_query = sqlx_query.bind(
                statuses
                    .iter()
                    .map(|s| s.as_str().to_string())
                    .collect::<Vec<String>>(),
            );
        }
        if !query.exclude_statuses.is_empty() {
            sqlx_query = sqlx_query.bind(
                query
                    .exclude_statuses
                    .iter()
                    .map(|s| s.as_str().to_string())
                    .collect::<Vec<String>>(),
            );
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_order).collect()
    }

    async fn expire_pending_orders(&self, now: DateTime<Utc>) -> Result<Vec<Order>> {
        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query(&format!(
            r#"
            DELETE FROM orders
            WHERE status = 'PENDING' AND payment_status = 'PENDING'
              AND expires_at IS NOT NULL AND expires_at <= $1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(now)
        .fetch_all(&mut *tx)
        .await?;

        let orders = rows
            .iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;
        for order in &orders {
            Self::restore_stock(&mut tx, order).await?;
        }
        tx.commit().await?;
        Ok(orders)
    }
}

#[async_trait]
impl AddressStore for PostgresStore {
    async fn find_owned_address(
        &self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<Option<Address>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, full_name, phone, alternate_phone, state, city, address,
                   pincode, address_type, created_at
            FROM addresses
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(address_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<Address> {
            Ok(Address {
                id: AddressId::from_uuid(row.try_get("id")?),
                user_id: UserId::from_uuid(row.try_get("user_id")?),
                full_name: row.try_get("full_name")?,
                phone: row.try_get("phone")?,
                alternate_phone: row.try_get("alternate_phone")?,
                state: row.try_get("state")?,
                city: row.try_get("city")?,
                address: row.try_get("address")?,
                pincode: row.try_get("pincode")?,
                address_type: row.try_get("address_type")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn find_user(&self, user_id: UserId) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, email, phone, role FROM users WHERE id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> Result<User> {
            let role = match row.try_get::<String, _>("role")?.as_str() {
                "admin" => Role::Admin,
                _ => Role::User,
            };
            Ok(User {
                id: UserId::from_uuid(row.try_get("id")?),
                username: row.try_get("username")?,
                email: row.try_get("email")?,
                phone: row.try_get("phone")?,
                role,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl NotificationStore for PostgresStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, title, description, scope, user_id, extra, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(notification.id.as_uuid())
        .bind(&notification.title)
        .bind(&notification.description)
        .bind(notification.scope.as_str())
        .bind(notification.user_id.map(|u| u.as_uuid()))
        .bind(&notification.extra)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn notifications_for(&self, user_id: UserId) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, scope, user_id, extra, created_at
            FROM notifications
            WHERE scope = 'PUBLIC' OR (scope = 'PRIVATE' AND user_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_notification).collect()
    }
}

#[async_trait]
impl RatingStore for PostgresStore {
    async fn insert_rating(&self, rating: &Rating) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ratings (id, user_id, product_id, star, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(rating.id.as_uuid())
        .bind(rating.user_id.as_uuid())
        .bind(rating.product_id.as_uuid())
        .bind(i16::from(rating.star))
        .bind(&rating.description)
        .bind(rating.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn has_delivered_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool> {
        let containing = serde_json::json!([{ "productId": product_id }]);
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM orders
                WHERE user_id = $1 AND status = 'DELIVERED' AND lines @> $2
            )
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(Json(containing))
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

#[async_trait]
impl SeedStore for PostgresStore {
    async fn upsert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(&format!(
            r#"
            INSERT INTO products ({PRODUCT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name, description = EXCLUDED.description,
                price = EXCLUDED.price, list_price = EXCLUDED.list_price,
                stock = EXCLUDED.stock, is_active = EXCLUDED.is_active,
                brand_id = EXCLUDED.brand_id, category_ids = EXCLUDED.category_ids,
                images = EXCLUDED.images, updated_at = EXCLUDED.updated_at
            "#
        ))
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.minor_units())
        .bind(product.list_price.minor_units())
        .bind(i64::from(product.stock))
        .bind(product.is_active)
        .bind(product.brand_id.map(|b| b.as_uuid()))
        .bind(
            product
                .category_ids
                .iter()
                .map(CategoryId::as_uuid)
                .collect::<Vec<Uuid>>(),
        )
        .bind(Json(&product.images))
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_brand(&self, brand: &Brand) -> Result<()> {
        sqlx::query("INSERT INTO brands (id, name, icon) VALUES ($1, $2, $3)")
            .bind(brand.id.as_uuid())
            .bind(&brand.name)
            .bind(&brand.icon)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_category(&self, category: &Category) -> Result<()> {
        sqlx::query("INSERT INTO categories (id, name, icon) VALUES ($1, $2, $3)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .bind(&category.icon)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        let role = match user.role {
            Role::Admin => "admin",
            Role::User => "user",
        };
        sqlx::query(
            "INSERT INTO users (id, username, email, phone, role) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(role)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_address(&self, address: &Address) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO addresses (id, user_id, full_name, phone, alternate_phone, state, city,
                                   address, pincode, address_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(address.id.as_uuid())
        .bind(address.user_id.as_uuid())
        .bind(&address.full_name)
        .bind(&address.phone)
        .bind(&address.alternate_phone)
        .bind(&address.state)
        .bind(&address.city)
        .bind(&address.address)
        .bind(&address.pincode)
        .bind(&address.address_type)
        .bind(address.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
