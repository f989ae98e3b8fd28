//! Order aggregate and related types.

mod address;
mod aggregate;
mod number;
mod payment;
mod status;

pub use address::Address;
pub use aggregate::{Order, OrderItem, TimelineEntry};
pub use number::generate_order_number;
pub use payment::{Payment, PaymentDetails, PaymentMethod};
pub use status::OrderStatus;

use thiserror::Error;

/// Errors raised by order creation and lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// An order cannot be created from an empty cart.
    #[error("cannot create an order with no items")]
    NoItems,

    /// Mobile-banking payment methods need their transaction fields.
    #[error("payment method {method} requires mobile number and transaction number")]
    MissingPaymentDetails { method: PaymentMethod },

    /// The requested status change is not a legal transition.
    #[error("cannot transition order from {from} to {to}")]
    IllegalStatusTransition { from: OrderStatus, to: OrderStatus },

    /// Only pending or confirmed orders may be cancelled.
    #[error("order in status {status} cannot be cancelled")]
    NotCancellable { status: OrderStatus },
}
