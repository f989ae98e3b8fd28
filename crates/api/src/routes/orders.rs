//! Order placement and lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use checkout::CheckoutRequest;
use common::OrderId;
use domain::OrderStatus;
use domain::order::{Address, PaymentMethod, TimelineEntry};
use serde::{Deserialize, Serialize};
use store::{CartStore, OrderStore, ProductStore};

use crate::AppState;
use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::routes::{envelope, envelope_with_message};

#[derive(Deserialize)]
pub struct PlaceOrderBody {
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub payment_method: PaymentMethod,
    pub mobile_number: Option<String>,
    pub transaction_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct SetStatusBody {
    pub status: OrderStatus,
    pub note: Option<String>,
}

#[derive(Serialize)]
pub struct TrackingResponse {
    pub order_number: String,
    pub status: OrderStatus,
    pub timeline: Vec<TimelineEntry>,
}

/// POST /orders — place an order from the current cart.
#[tracing::instrument(skip(state, body))]
pub async fn create<P, C, O>(
    State(state): State<Arc<AppState<P, C, O>>>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<PlaceOrderBody>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), ApiError>
where
    P: ProductStore + Clone + 'static,
    C: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
{
    let order = state
        .orchestrator
        .place_order(
            user_id,
            CheckoutRequest {
                shipping_address: body.shipping_address,
                billing_address: body.billing_address,
                payment_method: body.payment_method,
                mobile_number: body.mobile_number,
                transaction_number: body.transaction_number,
                notes: body.notes,
            },
        )
        .await?;
    Ok((
        axum::http::StatusCode::CREATED,
        envelope_with_message(order, "Order placed successfully"),
    ))
}

/// GET /orders — the user's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<P, C, O>(
    State(state): State<Arc<AppState<P, C, O>>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<serde_json::Value>, ApiError>
where
    P: ProductStore + Clone + 'static,
    C: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
{
    let orders = state.order_flow.orders_for(user_id).await?;
    Ok(envelope(orders))
}

/// GET /orders/:id — one order, owner only.
#[tracing::instrument(skip(state))]
pub async fn get<P, C, O>(
    State(state): State<Arc<AppState<P, C, O>>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    P: ProductStore + Clone + 'static,
    C: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
{
    let order_id = parse_order_id(&id)?;
    let order = state.order_flow.order(user_id, order_id).await?;
    Ok(envelope(order))
}

/// PUT /orders/:id/cancel — cancel a pending or confirmed order,
/// releasing its stock.
#[tracing::instrument(skip(state))]
pub async fn cancel<P, C, O>(
    State(state): State<Arc<AppState<P, C, O>>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    P: ProductStore + Clone + 'static,
    C: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
{
    let order_id = parse_order_id(&id)?;
    let order = state.order_flow.cancel(user_id, order_id).await?;
    Ok(envelope_with_message(order, "Order cancelled"))
}

/// PUT /orders/:id/status — move an order along the fulfillment pipeline.
#[tracing::instrument(skip(state, body))]
pub async fn set_status<P, C, O>(
    State(state): State<Arc<AppState<P, C, O>>>,
    Path(id): Path<String>,
    Json(body): Json<SetStatusBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    P: ProductStore + Clone + 'static,
    C: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
{
    let order_id = parse_order_id(&id)?;
    let order = state
        .order_flow
        .set_status(order_id, body.status, body.note)
        .await?;
    Ok(envelope(order))
}

/// GET /orders/:id/tracking — order status plus full timeline.
#[tracing::instrument(skip(state))]
pub async fn tracking<P, C, O>(
    State(state): State<Arc<AppState<P, C, O>>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    P: ProductStore + Clone + 'static,
    C: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
{
    let order_id = parse_order_id(&id)?;
    let order = state.order_flow.order(user_id, order_id).await?;
    Ok(envelope(TrackingResponse {
        order_number: order.order_number,
        status: order.status,
        timeline: order.timeline,
    }))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid order id: {id}")))
}
