//! Human-readable order number generation.

use chrono::{DateTime, Utc};
use rand::Rng;

/// Generates an order number of the form `ORD-YYYYMMDD-NNNNNN`.
///
/// The suffix is six random digits, so uniqueness is probabilistic only.
/// Orders are keyed by their UUID; this value is for humans and receipts.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::rng().random_range(0..1_000_000);
    format!("ORD-{}-{suffix:06}", now.format("%Y%m%d"))
}
