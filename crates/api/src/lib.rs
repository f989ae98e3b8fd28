//! HTTP API server for the commerce backend.
//!
//! Exposes cart, checkout, order lifecycle, and catalog endpoints with
//! structured logging (tracing) and Prometheus metrics. Every response
//! uses the `{success, data?|error, message?}` envelope.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use checkout::{CartService, CheckoutOrchestrator, OrderFlow};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{
    CartStore, InMemoryCartStore, InMemoryOrderStore, InMemoryProductStore, OrderStore,
    ProductStore,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<P: ProductStore, C: CartStore, O: OrderStore> {
    pub cart_service: CartService<P, C>,
    pub orchestrator: CheckoutOrchestrator<P, C, O>,
    pub order_flow: OrderFlow<P, O>,
    pub products: P,
}

/// Creates application state over any store implementations.
pub fn create_state<P, C, O>(products: P, carts: C, orders: O) -> Arc<AppState<P, C, O>>
where
    P: ProductStore + Clone + 'static,
    C: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
{
    Arc::new(AppState {
        cart_service: CartService::new(products.clone(), carts.clone()),
        orchestrator: CheckoutOrchestrator::new(products.clone(), carts, orders.clone()),
        order_flow: OrderFlow::new(products.clone(), orders),
        products,
    })
}

/// Creates application state over the in-memory stores.
pub fn create_memory_state()
-> Arc<AppState<InMemoryProductStore, InMemoryCartStore, InMemoryOrderStore>> {
    create_state(
        InMemoryProductStore::new(),
        InMemoryCartStore::new(),
        InMemoryOrderStore::new(),
    )
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<P, C, O>(state: Arc<AppState<P, C, O>>, metrics_handle: PrometheusHandle) -> Router
where
    P: ProductStore + Clone + 'static,
    C: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/cart", get(routes::cart::get::<P, C, O>))
        .route("/cart", delete(routes::cart::clear::<P, C, O>))
        .route("/cart/items", post(routes::cart::add_item::<P, C, O>))
        .route(
            "/cart/items/{item_id}",
            put(routes::cart::update_item::<P, C, O>),
        )
        .route(
            "/cart/items/{item_id}",
            delete(routes::cart::remove_item::<P, C, O>),
        )
        .route("/cart/coupon", post(routes::cart::apply_coupon::<P, C, O>))
        .route(
            "/cart/coupon",
            delete(routes::cart::remove_coupon::<P, C, O>),
        )
        .route("/orders", post(routes::orders::create::<P, C, O>))
        .route("/orders", get(routes::orders::list::<P, C, O>))
        .route("/orders/{id}", get(routes::orders::get::<P, C, O>))
        .route("/orders/{id}/cancel", put(routes::orders::cancel::<P, C, O>))
        .route(
            "/orders/{id}/status",
            put(routes::orders::set_status::<P, C, O>),
        )
        .route(
            "/orders/{id}/tracking",
            get(routes::orders::tracking::<P, C, O>),
        )
        .route("/products", get(routes::products::list::<P, C, O>))
        .route("/products", post(routes::products::create::<P, C, O>))
        .route("/products/{id}", get(routes::products::get::<P, C, O>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
