//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use checkout::AddItemRequest;
use common::{LineItemId, ProductId};
use serde::Deserialize;
use store::{CartStore, OrderStore, ProductStore};

use crate::AppState;
use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::routes::{envelope, envelope_with_message};

#[derive(Deserialize)]
pub struct AddItemBody {
    pub product_id: ProductId,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateQuantityBody {
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct CouponBody {
    pub code: String,
}

/// GET /cart — the user's cart, created empty on first access.
#[tracing::instrument(skip(state))]
pub async fn get<P, C, O>(
    State(state): State<Arc<AppState<P, C, O>>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<serde_json::Value>, ApiError>
where
    P: ProductStore + Clone + 'static,
    C: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
{
    let cart = state.cart_service.cart(user_id).await?;
    Ok(envelope(cart))
}

/// POST /cart/items — add an item, merging into an existing line.
#[tracing::instrument(skip(state, body))]
pub async fn add_item<P, C, O>(
    State(state): State<Arc<AppState<P, C, O>>>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<AddItemBody>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), ApiError>
where
    P: ProductStore + Clone + 'static,
    C: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
{
    let cart = state
        .cart_service
        .add_item(
            user_id,
            AddItemRequest {
                product_id: body.product_id,
                quantity: body.quantity,
                size: body.size,
                color: body.color,
            },
        )
        .await?;
    Ok((
        axum::http::StatusCode::CREATED,
        envelope_with_message(cart, "Item added to cart"),
    ))
}

/// PUT /cart/items/:item_id — set a line's quantity (≤ 0 removes it).
#[tracing::instrument(skip(state, body))]
pub async fn update_item<P, C, O>(
    State(state): State<Arc<AppState<P, C, O>>>,
    AuthUser(user_id): AuthUser,
    Path(item_id): Path<String>,
    Json(body): Json<UpdateQuantityBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    P: ProductStore + Clone + 'static,
    C: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
{
    let item_id = parse_item_id(&item_id)?;
    let cart = state
        .cart_service
        .update_quantity(user_id, item_id, body.quantity)
        .await?;
    Ok(envelope(cart))
}

/// DELETE /cart/items/:item_id — remove a line.
#[tracing::instrument(skip(state))]
pub async fn remove_item<P, C, O>(
    State(state): State<Arc<AppState<P, C, O>>>,
    AuthUser(user_id): AuthUser,
    Path(item_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    P: ProductStore + Clone + 'static,
    C: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
{
    let item_id = parse_item_id(&item_id)?;
    let cart = state.cart_service.remove_item(user_id, item_id).await?;
    Ok(envelope_with_message(cart, "Item removed from cart"))
}

/// DELETE /cart — empty the cart.
#[tracing::instrument(skip(state))]
pub async fn clear<P, C, O>(
    State(state): State<Arc<AppState<P, C, O>>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<serde_json::Value>, ApiError>
where
    P: ProductStore + Clone + 'static,
    C: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
{
    let cart = state.cart_service.clear(user_id).await?;
    Ok(envelope_with_message(cart, "Cart cleared"))
}

/// POST /cart/coupon — apply a coupon code.
#[tracing::instrument(skip(state, body))]
pub async fn apply_coupon<P, C, O>(
    State(state): State<Arc<AppState<P, C, O>>>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CouponBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    P: ProductStore + Clone + 'static,
    C: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
{
    let cart = state.cart_service.apply_coupon(user_id, &body.code).await?;
    Ok(envelope_with_message(cart, "Coupon applied"))
}

/// DELETE /cart/coupon — drop the applied coupon.
#[tracing::instrument(skip(state))]
pub async fn remove_coupon<P, C, O>(
    State(state): State<Arc<AppState<P, C, O>>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<serde_json::Value>, ApiError>
where
    P: ProductStore + Clone + 'static,
    C: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
{
    let cart = state.cart_service.remove_coupon(user_id).await?;
    Ok(envelope_with_message(cart, "Coupon removed"))
}

fn parse_item_id(id: &str) -> Result<LineItemId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid item id: {id}")))
}
