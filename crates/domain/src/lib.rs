//! Domain layer for the commerce backend.
//!
//! This crate provides the core aggregates and value objects:
//! - [`Product`] with per-size or free-size stock and the availability
//!   contract used by the inventory ledger
//! - [`Cart`] with line-item merging, coupons, and derived totals
//! - [`Order`] as an immutable snapshot with a status state machine
//!
//! Aggregates here are pure state; persistence and orchestration live in
//! the `store` and `checkout` crates.

pub mod cart;
pub mod coupon;
pub mod order;
pub mod product;

pub use cart::{Cart, CartError, CartItem, Totals};
pub use coupon::{Coupon, CouponKind};
pub use order::{
    Address, Order, OrderError, OrderItem, OrderStatus, Payment, PaymentDetails, PaymentMethod,
    TimelineEntry,
};
pub use product::{Product, ProductInventory, SizeSelection, SizeStock, StockError};
