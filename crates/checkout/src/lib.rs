//! Cart mutation service and the cart-to-order checkout pipeline.
//!
//! Three collaborators over the `store` traits:
//! - [`CartService`] — add/update/remove/coupon operations, each
//!   re-validated against live inventory
//! - [`CheckoutOrchestrator`] — converts a validated cart into an order:
//!   validate every line, reserve stock with rollback on partial failure,
//!   persist the order, clear the cart last
//! - [`OrderFlow`] — order reads, cancellation with compensating stock
//!   release, and admin status transitions

mod cart_service;
mod error;
mod orchestrator;
mod order_flow;

pub use cart_service::{AddItemRequest, CartService};
pub use error::CheckoutError;
pub use orchestrator::{CheckoutOrchestrator, CheckoutRequest};
pub use order_flow::OrderFlow;

/// Convenience alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
