//! Store error types.

use common::ProductId;
use domain::StockError;
use thiserror::Error;

/// Errors that can occur in the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A stock operation targeted a product that does not exist.
    #[error("product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// A reservation or release failed a stock invariant.
    #[error(transparent)]
    Stock(#[from] StockError),

    /// Database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Document (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns the inner stock error, if this is a stock failure.
    pub fn as_stock(&self) -> Option<&StockError> {
        match self {
            StoreError::Stock(e) => Some(e),
            _ => None,
        }
    }
}
