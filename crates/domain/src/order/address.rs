//! Shipping and billing addresses.

use serde::{Deserialize, Serialize};

/// A postal address attached to an order.
///
/// All fields except `line2` and `phone` are required by deserialization;
/// billing defaults to the shipping address when omitted at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub full_name: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}
