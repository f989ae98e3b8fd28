//! HTTP route handlers.
//!
//! Every response uses the `{success, data?|error, message?}` envelope.

pub mod cart;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use axum::Json;
use serde::Serialize;

/// Wraps a payload in the success envelope.
pub fn envelope<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "data": data }))
}

/// Wraps a payload in the success envelope with a human-readable message.
pub fn envelope_with_message<T: Serialize>(data: T, message: &str) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "data": data, "message": message }))
}
