//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::{CartError, OrderError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed `x-user-id` header.
    Unauthorized,
    /// Bad request from the client.
    BadRequest(String),
    /// Checkout / cart / order logic error.
    Checkout(CheckoutError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "authentication required".to_string(),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({ "success": false, "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::CartNotFound
        | CheckoutError::ProductNotFound { .. }
        | CheckoutError::OrderNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        CheckoutError::Cart(CartError::ItemNotFound { .. }) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        CheckoutError::NotOwner => (StatusCode::FORBIDDEN, err.to_string()),
        CheckoutError::Order(OrderError::IllegalStatusTransition { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        CheckoutError::CartEmpty
        | CheckoutError::ProductInactive { .. }
        | CheckoutError::Stock { .. }
        | CheckoutError::Cart(_)
        | CheckoutError::Order(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CheckoutError::Store(inner) => {
            // The real cause is logged, never exposed.
            tracing::error!(error = %inner, "store failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}
