//! Persistence layer for the commerce backend.
//!
//! Defines the [`ProductStore`], [`CartStore`], and [`OrderStore`] traits
//! and two implementations of each: in-memory (tests and the default
//! server) and Postgres (sqlx).
//!
//! The one hard contract here is [`ProductStore::reserve_stock`]: a single
//! atomic decrement-if-sufficient. Two concurrent reservations against the
//! same (product, size) must never both succeed past the remaining stock.

mod error;
pub mod memory;
pub mod postgres;
mod store;

pub use error::StoreError;
pub use memory::{InMemoryCartStore, InMemoryOrderStore, InMemoryProductStore};
pub use postgres::PostgresStore;
pub use store::{CartStore, OrderStore, ProductStore};

/// Convenience alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;
