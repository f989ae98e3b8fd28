//! Checkout error types.

use common::{OrderId, ProductId};
use domain::{CartError, OrderError, StockError};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during cart mutation, checkout, and order
/// lifecycle operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The user has no cart yet.
    #[error("cart not found")]
    CartNotFound,

    /// The cart exists but holds no items.
    #[error("cart is empty")]
    CartEmpty,

    /// A referenced product does not exist.
    #[error("product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// The product was deactivated since it was added.
    #[error("product '{name}' is no longer available")]
    ProductInactive { name: String },

    /// A stock check or reservation failed; carries the product name so
    /// the client knows which line to correct.
    #[error("'{product}': {source}")]
    Stock {
        product: String,
        #[source]
        source: StockError,
    },

    /// Cart-level validation failure.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Order-level validation or transition failure.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// The order does not exist.
    #[error("order not found: {order_id}")]
    OrderNotFound { order_id: OrderId },

    /// The caller does not own the resource.
    #[error("order does not belong to this user")]
    NotOwner,

    /// Persistence failure.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CheckoutError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ProductNotFound { product_id } => {
                CheckoutError::ProductNotFound { product_id }
            }
            other => CheckoutError::Store(other),
        }
    }
}

impl CheckoutError {
    /// Wraps a stock error with the product name for a client-correctable
    /// message.
    pub(crate) fn from_stock(product: &domain::Product, source: StockError) -> Self {
        CheckoutError::Stock {
            product: product.name.clone(),
            source,
        }
    }

    /// Wraps a store error from a stock operation with the product name
    /// for a client-correctable message.
    pub(crate) fn from_stock_op(err: StoreError, product_name: &str) -> Self {
        match err {
            StoreError::Stock(source) => CheckoutError::Stock {
                product: product_name.to_string(),
                source,
            },
            other => other.into(),
        }
    }

    /// Returns true if this is a client error (invalid input or business
    /// rule) rather than an internal failure.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CheckoutError::Store(_))
    }
}
