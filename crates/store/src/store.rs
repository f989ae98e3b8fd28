//! Store trait contracts.

use async_trait::async_trait;
use common::{OrderId, ProductId, UserId};
use domain::{Cart, Order, Product, SizeSelection};

use crate::Result;

/// Catalog and inventory access.
///
/// `reserve_stock` and `release_stock` are the inventory ledger: the only
/// operations that mutate stock counters, and the only place cross-request
/// mutual exclusion is required.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Fetches a product by id.
    async fn get(&self, product_id: ProductId) -> Result<Option<Product>>;

    /// Lists all products.
    async fn list(&self) -> Result<Vec<Product>>;

    /// Inserts or replaces a product.
    async fn upsert(&self, product: &Product) -> Result<()>;

    /// Atomically decrements stock for (product, size) by `quantity`,
    /// flipping availability off when the counter reaches zero.
    ///
    /// Must be a single conditional update — decrement-if-sufficient —
    /// not a read-then-write pair. Fails with [`domain::StockError`]
    /// (wrapped in [`crate::StoreError::Stock`]) when the size is missing,
    /// switched off, or short on stock; the caller aborts, it never
    /// retries.
    async fn reserve_stock(
        &self,
        product_id: ProductId,
        selection: &SizeSelection,
        quantity: u32,
    ) -> Result<()>;

    /// Restores `quantity` units for (product, size), flipping
    /// availability back on. The inverse of `reserve_stock`, used when an
    /// order is cancelled or a checkout aborts mid-reservation.
    async fn release_stock(
        &self,
        product_id: ProductId,
        selection: &SizeSelection,
        quantity: u32,
    ) -> Result<()>;
}

/// Cart persistence, one document per user.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Fetches the user's cart, if one exists.
    async fn get(&self, user_id: UserId) -> Result<Option<Cart>>;

    /// Inserts or replaces the user's cart.
    async fn save(&self, cart: &Cart) -> Result<()>;
}

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetches an order by id.
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Lists a user's orders, newest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Persists a newly created order.
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Replaces an existing order (status/timeline updates).
    async fn update(&self, order: &Order) -> Result<()>;
}
