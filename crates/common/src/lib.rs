//! Shared types used across the commerce backend.
//!
//! Provides UUID-backed identifier newtypes and the [`Money`] value type.
//! Keeping these in one leaf crate prevents id mix-ups between layers.

mod money;
mod types;

pub use money::Money;
pub use types::{LineItemId, OrderId, ProductId, UserId};
