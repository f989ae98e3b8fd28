//! Catalog endpoints.
//!
//! The catalog proper lives in a separate service; these endpoints give
//! the commerce core a standalone product surface for seeding and reads.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{Money, ProductId};
use domain::{Product, ProductInventory, SizeStock};
use serde::Deserialize;
use store::{CartStore, OrderStore, ProductStore};

use crate::AppState;
use crate::error::ApiError;
use crate::routes::{envelope, envelope_with_message};

#[derive(Deserialize)]
pub struct SizeStockBody {
    pub size: String,
    pub stock: u32,
}

#[derive(Deserialize)]
pub struct CreateProductBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    pub original_price_cents: Option<i64>,
    /// Per-size stock; mutually exclusive with `stock`.
    pub sizes: Option<Vec<SizeStockBody>>,
    /// Free-size stock counter.
    pub stock: Option<u32>,
}

/// GET /products — all products.
#[tracing::instrument(skip(state))]
pub async fn list<P, C, O>(
    State(state): State<Arc<AppState<P, C, O>>>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    P: ProductStore + Clone + 'static,
    C: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
{
    let products = state.products.list().await.map_err(checkout_store)?;
    Ok(envelope(products))
}

/// GET /products/:id — one product.
#[tracing::instrument(skip(state))]
pub async fn get<P, C, O>(
    State(state): State<Arc<AppState<P, C, O>>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    P: ProductStore + Clone + 'static,
    C: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
{
    let product_id = parse_product_id(&id)?;
    let product = state
        .products
        .get(product_id)
        .await
        .map_err(checkout_store)?
        .ok_or(ApiError::Checkout(
            checkout::CheckoutError::ProductNotFound { product_id },
        ))?;
    Ok(envelope(product))
}

/// POST /products — seed or replace a product.
#[tracing::instrument(skip(state, body))]
pub async fn create<P, C, O>(
    State(state): State<Arc<AppState<P, C, O>>>,
    Json(body): Json<CreateProductBody>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), ApiError>
where
    P: ProductStore + Clone + 'static,
    C: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
{
    let inventory = match (body.sizes, body.stock) {
        (Some(sizes), None) => ProductInventory::Sized(
            sizes
                .into_iter()
                .map(|s| SizeStock::new(s.size, s.stock))
                .collect(),
        ),
        (None, Some(stock)) => ProductInventory::free_size(stock),
        _ => {
            return Err(ApiError::BadRequest(
                "provide exactly one of `sizes` or `stock`".to_string(),
            ));
        }
    };

    let mut product = Product::new(body.name, Money::from_cents(body.price_cents), inventory);
    product.description = body.description;
    product.original_price = body.original_price_cents.map(Money::from_cents);

    state.products.upsert(&product).await.map_err(checkout_store)?;
    Ok((
        axum::http::StatusCode::CREATED,
        envelope_with_message(product, "Product created"),
    ))
}

fn parse_product_id(id: &str) -> Result<ProductId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid product id: {id}")))
}

fn checkout_store(err: store::StoreError) -> ApiError {
    ApiError::Checkout(err.into())
}
