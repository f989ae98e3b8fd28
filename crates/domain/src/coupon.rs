//! Coupon codes and discount computation.

use common::Money;
use serde::{Deserialize, Serialize};

/// How a coupon's discount is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    /// Percentage of the subtotal, in basis points (1000 = 10%).
    Percentage { basis_points: i64 },
    /// Flat amount off.
    Fixed { amount: Money },
}

/// A recognized coupon applied to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub kind: CouponKind,
}

impl Coupon {
    /// Looks up a code against the fixed recognized set.
    ///
    /// Codes are matched case-insensitively and stored uppercased.
    pub fn lookup(code: &str) -> Option<Coupon> {
        let code = code.trim().to_uppercase();
        let kind = match code.as_str() {
            "WELCOME10" => CouponKind::Percentage { basis_points: 1_000 },
            "SAVE20" => CouponKind::Percentage { basis_points: 2_000 },
            "FREESHIP" => CouponKind::Fixed {
                amount: Money::from_cents(599),
            },
            _ => return None,
        };
        Some(Coupon { code, kind })
    }

    /// Computes the discount for a subtotal, capped at the subtotal so a
    /// discount can never push totals negative.
    pub fn discount_for(&self, subtotal: Money) -> Money {
        let raw = match self.kind {
            CouponKind::Percentage { basis_points } => subtotal.percent_bps(basis_points),
            CouponKind::Fixed { amount } => amount,
        };
        raw.min(subtotal)
    }
}
