//! PostgreSQL-backed store implementations.
//!
//! Products keep their stock counters in relational columns so that
//! `reserve_stock` can be one conditional `UPDATE ... WHERE stock >= $n`;
//! carts and orders are stored as JSONB documents.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use domain::{Cart, Order, Product, ProductInventory, SizeSelection, SizeStock, StockError};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    store::{CartStore, OrderStore, ProductStore},
};

/// One store over a shared connection pool, implementing all three traits.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    async fn product_exists(&self, product_id: ProductId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
            .bind(product_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    fn row_to_product(row: &PgRow, sizes: Vec<SizeStock>) -> Result<Product> {
        let free_size_stock: Option<i64> = row.try_get("free_size_stock")?;
        let inventory = match free_size_stock {
            Some(stock) => ProductInventory::FreeSize {
                stock: clamp_stock(stock),
                available: row
                    .try_get::<Option<bool>, _>("free_size_available")?
                    .unwrap_or(stock > 0),
            },
            None => ProductInventory::Sized(sizes),
        };

        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            original_price: row
                .try_get::<Option<i64>, _>("original_price_cents")?
                .map(Money::from_cents),
            active: row.try_get("active")?,
            inventory,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }

    async fn sizes_for(&self, product_id: Uuid) -> Result<Vec<SizeStock>> {
        let rows = sqlx::query(
            "SELECT size, stock, available FROM product_sizes WHERE product_id = $1 ORDER BY size",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(SizeStock {
                    size: row.try_get("size")?,
                    stock: clamp_stock(row.try_get("stock")?),
                    available: row.try_get("available")?,
                })
            })
            .collect()
    }

    /// Explains why a conditional sized-stock update matched no rows.
    async fn diagnose_sized_reserve(
        &self,
        product_id: ProductId,
        size: &str,
        requested: u32,
    ) -> StoreError {
        let row = sqlx::query("SELECT stock, available FROM product_sizes WHERE product_id = $1 AND size = $2")
            .bind(product_id.as_uuid())
            .bind(size)
            .fetch_optional(&self.pool)
            .await;

        match row {
            Ok(Some(row)) => {
                let stock: i64 = row.try_get("stock").unwrap_or(0);
                let available: bool = row.try_get("available").unwrap_or(false);
                if !available && stock > 0 {
                    StoreError::Stock(StockError::SizeUnavailable {
                        size: size.to_string(),
                    })
                } else {
                    StoreError::Stock(StockError::InsufficientStock {
                        size: size.to_string(),
                        requested,
                        available: clamp_stock(stock),
                    })
                }
            }
            Ok(None) => match self.product_exists(product_id).await {
                Ok(false) => StoreError::ProductNotFound { product_id },
                _ => StoreError::Stock(StockError::SizeNotFound {
                    size: size.to_string(),
                }),
            },
            Err(e) => StoreError::Database(e),
        }
    }

    async fn diagnose_free_size_reserve(
        &self,
        product_id: ProductId,
        requested: u32,
    ) -> StoreError {
        let row = sqlx::query(
            "SELECT free_size_stock, free_size_available FROM products WHERE id = $1",
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await;

        match row {
            Ok(Some(row)) => {
                let stock: Option<i64> = row.try_get("free_size_stock").unwrap_or(None);
                let available: bool = row
                    .try_get::<Option<bool>, _>("free_size_available")
                    .ok()
                    .flatten()
                    .unwrap_or(false);
                match stock {
                    // Sized product addressed as free-size
                    None => StoreError::Stock(StockError::SizeNotFound {
                        size: SizeSelection::Unsized.to_string(),
                    }),
                    Some(stock) if !available && stock > 0 => {
                        StoreError::Stock(StockError::SizeUnavailable {
                            size: SizeSelection::Unsized.to_string(),
                        })
                    }
                    Some(stock) => StoreError::Stock(StockError::InsufficientStock {
                        size: SizeSelection::Unsized.to_string(),
                        requested,
                        available: clamp_stock(stock),
                    }),
                }
            }
            Ok(None) => StoreError::ProductNotFound { product_id },
            Err(e) => StoreError::Database(e),
        }
    }
}

fn clamp_stock(stock: i64) -> u32 {
    u32::try_from(stock).unwrap_or(u32::MAX)
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn get(&self, product_id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, price_cents, original_price_cents, active,
                   free_size_stock, free_size_available, created_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };
        let sizes = self.sizes_for(product_id.as_uuid()).await?;
        Ok(Some(Self::row_to_product(&row, sizes)?))
    }

    async fn list(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, price_cents, original_price_cents, active,
                   free_size_stock, free_size_available, created_at
            FROM products
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            let id: Uuid = row.try_get("id")?;
            let sizes = self.sizes_for(id).await?;
            products.push(Self::row_to_product(&row, sizes)?);
        }
        Ok(products)
    }

    async fn upsert(&self, product: &Product) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let (free_size_stock, free_size_available) = match &product.inventory {
            ProductInventory::FreeSize { stock, available } => {
                (Some(i64::from(*stock)), Some(*available))
            }
            ProductInventory::Sized(_) => (None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_cents, original_price_cents,
                                  active, free_size_stock, free_size_available, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                price_cents = EXCLUDED.price_cents,
                original_price_cents = EXCLUDED.original_price_cents,
                active = EXCLUDED.active,
                free_size_stock = EXCLUDED.free_size_stock,
                free_size_available = EXCLUDED.free_size_available
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.original_price.map(|m| m.cents()))
        .bind(product.active)
        .bind(free_size_stock)
        .bind(free_size_available)
        .bind(product.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM product_sizes WHERE product_id = $1")
            .bind(product.id.as_uuid())
            .execute(&mut *tx)
            .await?;

        if let ProductInventory::Sized(sizes) = &product.inventory {
            for entry in sizes {
                sqlx::query(
                    r#"
                    INSERT INTO product_sizes (product_id, size, stock, available)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(product.id.as_uuid())
                .bind(&entry.size)
                .bind(i64::from(entry.stock))
                .bind(entry.available)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn reserve_stock(
        &self,
        product_id: ProductId,
        selection: &SizeSelection,
        quantity: u32,
    ) -> Result<()> {
        let quantity_i64 = i64::from(quantity);
        match selection {
            SizeSelection::Sized(size) => {
                // Decrement-if-sufficient in one statement; the WHERE clause
                // is the race-free re-check required at commit time.
                let result = sqlx::query(
                    r#"
                    UPDATE product_sizes
                    SET stock = stock - $3, available = (stock - $3) > 0
                    WHERE product_id = $1 AND size = $2 AND available AND stock >= $3
                    "#,
                )
                .bind(product_id.as_uuid())
                .bind(size)
                .bind(quantity_i64)
                .execute(&self.pool)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(self.diagnose_sized_reserve(product_id, size, quantity).await);
                }
                Ok(())
            }
            SizeSelection::Unsized => {
                let result = sqlx::query(
                    r#"
                    UPDATE products
                    SET free_size_stock = free_size_stock - $2,
                        free_size_available = (free_size_stock - $2) > 0
                    WHERE id = $1
                      AND free_size_available
                      AND free_size_stock >= $2
                    "#,
                )
                .bind(product_id.as_uuid())
                .bind(quantity_i64)
                .execute(&self.pool)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(self.diagnose_free_size_reserve(product_id, quantity).await);
                }
                Ok(())
            }
        }
    }

    async fn release_stock(
        &self,
        product_id: ProductId,
        selection: &SizeSelection,
        quantity: u32,
    ) -> Result<()> {
        let quantity_i64 = i64::from(quantity);
        match selection {
            SizeSelection::Sized(size) => {
                let result = sqlx::query(
                    r#"
                    UPDATE product_sizes
                    SET stock = stock + $3, available = TRUE
                    WHERE product_id = $1 AND size = $2
                    "#,
                )
                .bind(product_id.as_uuid())
                .bind(size)
                .bind(quantity_i64)
                .execute(&self.pool)
                .await?;

                if result.rows_affected() == 0 {
                    if !self.product_exists(product_id).await? {
                        return Err(StoreError::ProductNotFound { product_id });
                    }
                    return Err(StoreError::Stock(StockError::SizeNotFound {
                        size: size.clone(),
                    }));
                }
                Ok(())
            }
            SizeSelection::Unsized => {
                let result = sqlx::query(
                    r#"
                    UPDATE products
                    SET free_size_stock = free_size_stock + $2, free_size_available = TRUE
                    WHERE id = $1 AND free_size_stock IS NOT NULL
                    "#,
                )
                .bind(product_id.as_uuid())
                .bind(quantity_i64)
                .execute(&self.pool)
                .await?;

                if result.rows_affected() == 0 {
                    if !self.product_exists(product_id).await? {
                        return Err(StoreError::ProductNotFound { product_id });
                    }
                    return Err(StoreError::Stock(StockError::SizeNotFound {
                        size: SizeSelection::Unsized.to_string(),
                    }));
                }
                Ok(())
            }
        }
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    async fn get(&self, user_id: UserId) -> Result<Option<Cart>> {
        let doc: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT doc FROM carts WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        doc.map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
            .transpose()
    }

    async fn save(&self, cart: &Cart) -> Result<()> {
        let doc = serde_json::to_value(cart)?;
        sqlx::query(
            r#"
            INSERT INTO carts (user_id, doc, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET
                doc = EXCLUDED.doc,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(cart.user_id.as_uuid())
        .bind(doc)
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        let doc: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT doc FROM orders WHERE id = $1")
                .bind(order_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        doc.map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
            .transpose()
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let docs: Vec<serde_json::Value> = sqlx::query_scalar(
            "SELECT doc FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        docs.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
            .collect()
    }

    async fn insert(&self, order: &Order) -> Result<()> {
        let doc = serde_json::to_value(order)?;
        sqlx::query(
            "INSERT INTO orders (id, user_id, doc, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(doc)
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, order: &Order) -> Result<()> {
        let doc = serde_json::to_value(order)?;
        sqlx::query("UPDATE orders SET doc = $2 WHERE id = $1")
            .bind(order.id.as_uuid())
            .bind(doc)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
