//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use common::{Money, ProductId, UserId};
use domain::{
    Cart, CartItem, Product, ProductInventory, SizeSelection, SizeStock, StockError,
};
use serial_test::serial;
use sqlx::PgPool;
use store::{CartStore, OrderStore, PostgresStore, ProductStore, StoreError};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!("../../../migrations/0001_init.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE products, product_sizes, carts, orders")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

fn sized_product(stock: u32) -> Product {
    Product::new(
        "Oxford Shirt",
        Money::from_cents(4_500),
        ProductInventory::Sized(vec![SizeStock::new("M", stock), SizeStock::new("L", 2)]),
    )
}

fn size_m() -> SizeSelection {
    SizeSelection::Sized("M".to_string())
}

#[tokio::test]
#[serial]
async fn test_product_roundtrip() {
    let store = get_test_store().await;
    let mut product = sized_product(5);
    product.description = "Classic button-down".to_string();
    product.original_price = Some(Money::from_cents(5_500));

    store.upsert(&product).await.unwrap();
    let loaded = ProductStore::get(&store, product.id).await.unwrap().unwrap();

    // created_at loses sub-microsecond precision in TIMESTAMPTZ
    assert_eq!(loaded.id, product.id);
    assert_eq!(loaded.name, product.name);
    assert_eq!(loaded.description, product.description);
    assert_eq!(loaded.price, product.price);
    assert_eq!(loaded.original_price, product.original_price);
    assert_eq!(loaded.active, product.active);
    assert_eq!(loaded.inventory, product.inventory);
}

#[tokio::test]
#[serial]
async fn test_free_size_product_roundtrip() {
    let store = get_test_store().await;
    let product = Product::new(
        "Canvas Tote",
        Money::from_cents(1_200),
        ProductInventory::free_size(3),
    );

    store.upsert(&product).await.unwrap();
    let loaded = ProductStore::get(&store, product.id).await.unwrap().unwrap();

    assert_eq!(loaded.inventory, ProductInventory::free_size(3));
}

#[tokio::test]
#[serial]
async fn test_reserve_stock_decrements() {
    let store = get_test_store().await;
    let product = sized_product(5);
    store.upsert(&product).await.unwrap();

    store.reserve_stock(product.id, &size_m(), 3).await.unwrap();

    let loaded = ProductStore::get(&store, product.id).await.unwrap().unwrap();
    assert_eq!(loaded.availability(&size_m()).unwrap(), 2);
}

#[tokio::test]
#[serial]
async fn test_reserve_to_zero_flips_availability() {
    let store = get_test_store().await;
    let product = sized_product(2);
    store.upsert(&product).await.unwrap();

    store.reserve_stock(product.id, &size_m(), 2).await.unwrap();

    let loaded = ProductStore::get(&store, product.id).await.unwrap().unwrap();
    let ProductInventory::Sized(sizes) = &loaded.inventory else {
        panic!("expected sized inventory");
    };
    let m = sizes.iter().find(|s| s.size == "M").unwrap();
    assert_eq!(m.stock, 0);
    assert!(!m.available);
}

#[tokio::test]
#[serial]
async fn test_reserve_insufficient_stock() {
    let store = get_test_store().await;
    let product = sized_product(2);
    store.upsert(&product).await.unwrap();

    let err = store.reserve_stock(product.id, &size_m(), 3).await.unwrap_err();

    assert!(matches!(
        err,
        StoreError::Stock(StockError::InsufficientStock {
            available: 2,
            requested: 3,
            ..
        })
    ));
    // No partial decrement
    let loaded = ProductStore::get(&store, product.id).await.unwrap().unwrap();
    assert_eq!(loaded.availability(&size_m()).unwrap(), 2);
}

#[tokio::test]
#[serial]
async fn test_reserve_unknown_size() {
    let store = get_test_store().await;
    let product = sized_product(2);
    store.upsert(&product).await.unwrap();

    let err = store
        .reserve_stock(product.id, &SizeSelection::Sized("XXL".to_string()), 1)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::Stock(StockError::SizeNotFound { .. })
    ));
}

#[tokio::test]
#[serial]
async fn test_reserve_unknown_product() {
    let store = get_test_store().await;
    let err = store
        .reserve_stock(ProductId::new(), &size_m(), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ProductNotFound { .. }));
}

#[tokio::test]
#[serial]
async fn test_concurrent_reserves_exactly_one_wins() {
    let store = get_test_store().await;
    let product = sized_product(1);
    store.upsert(&product).await.unwrap();

    let size = size_m();
    let (a, b) = tokio::join!(
        store.reserve_stock(product.id, &size, 1),
        store.reserve_stock(product.id, &size, 1),
    );

    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);

    let loaded = ProductStore::get(&store, product.id).await.unwrap().unwrap();
    assert_eq!(loaded.availability(&size_m()).unwrap(), 0);
}

#[tokio::test]
#[serial]
async fn test_release_restores_stock_and_availability() {
    let store = get_test_store().await;
    let product = sized_product(2);
    store.upsert(&product).await.unwrap();

    store.reserve_stock(product.id, &size_m(), 2).await.unwrap();
    store.release_stock(product.id, &size_m(), 2).await.unwrap();

    let loaded = ProductStore::get(&store, product.id).await.unwrap().unwrap();
    assert_eq!(loaded.availability(&size_m()).unwrap(), 2);
}

#[tokio::test]
#[serial]
async fn test_cart_document_roundtrip() {
    let store = get_test_store().await;
    let user_id = UserId::new();
    assert!(CartStore::get(&store, user_id).await.unwrap().is_none());

    let mut cart = Cart::new(user_id);
    cart.upsert_item(CartItem {
        id: common::LineItemId::new(),
        product_id: ProductId::new(),
        product_name: "Oxford Shirt".to_string(),
        quantity: 2,
        size: size_m(),
        color: Some("Blue".to_string()),
        unit_price: Money::from_cents(4_500),
        original_price: None,
        discount: Money::zero(),
    });
    cart.recompute_totals();

    store.save(&cart).await.unwrap();
    let loaded = CartStore::get(&store, user_id).await.unwrap().unwrap();
    assert_eq!(loaded, cart);

    // Save is an upsert
    cart.clear();
    store.save(&cart).await.unwrap();
    let loaded = CartStore::get(&store, user_id).await.unwrap().unwrap();
    assert!(loaded.is_empty());
}

#[tokio::test]
#[serial]
async fn test_order_insert_update_and_listing() {
    use domain::order::{Address, Payment, PaymentDetails, PaymentMethod};
    use domain::OrderStatus;

    let store = get_test_store().await;
    let user_id = UserId::new();

    let mut cart = Cart::new(user_id);
    cart.upsert_item(CartItem {
        id: common::LineItemId::new(),
        product_id: ProductId::new(),
        product_name: "Oxford Shirt".to_string(),
        quantity: 1,
        size: size_m(),
        color: None,
        unit_price: Money::from_cents(4_500),
        original_price: None,
        discount: Money::zero(),
    });
    cart.recompute_totals();

    let mut order = domain::Order::from_cart(
        &cart,
        Payment::new(PaymentMethod::CashOnDelivery, PaymentDetails::default()).unwrap(),
        Address {
            full_name: "Jordan Smith".to_string(),
            line1: "12 Hill Road".to_string(),
            line2: None,
            city: "Dhaka".to_string(),
            postal_code: "1207".to_string(),
            country: "BD".to_string(),
            phone: None,
        },
        None,
        None,
    )
    .unwrap();

    store.insert(&order).await.unwrap();

    order.update_status(OrderStatus::Confirmed, Some("Payment verified".to_string()));
    store.update(&order).await.unwrap();

    let loaded = OrderStore::get(&store, order.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, OrderStatus::Confirmed);
    assert_eq!(loaded.timeline.len(), 2);

    let listed = store.list_for_user(user_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(store.list_for_user(UserId::new()).await.unwrap().is_empty());
}
