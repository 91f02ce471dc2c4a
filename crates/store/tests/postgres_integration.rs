//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency. Every test
//! works on its own item and transaction ids, so they can run in parallel.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::sync::Arc;

use common::{
    Currency, CustomerIdentity, FulfillmentStatus, ItemId, Money, OrderId, PaymentStatus,
    TransactionId,
};
use futures_util::future::join_all;
use sqlx::PgPool;
use store::{
    InventoryLedger, Item, LedgerInsert, Order, OrderStore, PaymentLedger, PaymentRecord,
    PostgresStore, ReconciliationLog, ReconciliationTask, StoreError, TaskKind,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
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
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_bookstore_tables.sql"
            ))
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

async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&info.connection_string)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

async fn seed_item(store: &PostgresStore, stock: u32) -> ItemId {
    let item_id = ItemId::new(format!("book-{}", Uuid::new_v4()));
    store
        .upsert_item(Item::new(item_id.clone(), stock, Money::from_cents(1999)))
        .await
        .unwrap();
    item_id
}

fn unique_tx() -> TransactionId {
    TransactionId::new(format!("pi_{}", Uuid::new_v4().simple()))
}

#[tokio::test]
async fn reserve_decrements_in_place() {
    let store = get_test_store().await;
    let item_id = seed_item(&store, 3).await;

    assert_eq!(store.reserve(&item_id, 2).await.unwrap(), 1);

    let item = store.get_item(&item_id).await.unwrap().unwrap();
    assert_eq!(item.stock, 1);
    assert_eq!(item.price.cents(), 1999);
}

#[tokio::test]
async fn reserve_reports_available_stock_on_rejection() {
    let store = get_test_store().await;
    let item_id = seed_item(&store, 1).await;

    let err = store.reserve(&item_id, 2).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::InsufficientStock {
            available: 1,
            requested: 2,
            ..
        }
    ));
    assert_eq!(store.get_item(&item_id).await.unwrap().unwrap().stock, 1);
}

#[tokio::test]
async fn reserve_unknown_item_is_not_found() {
    let store = get_test_store().await;
    let err = store
        .reserve(&ItemId::new("no-such-book"), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ItemNotFound(_)));
}

#[tokio::test]
async fn concurrent_reservations_on_last_copy_have_one_winner() {
    let store = get_test_store().await;
    let item_id = seed_item(&store, 1).await;

    let attempts = (0..2).map(|_| {
        let store = store.clone();
        let item_id = item_id.clone();
        tokio::spawn(async move { store.reserve(&item_id, 1).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let rejections = results
        .iter()
        .filter(|r| matches!(r, Err(StoreError::InsufficientStock { .. })))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(rejections, 1);
    assert_eq!(store.get_item(&item_id).await.unwrap().unwrap().stock, 0);
}

#[tokio::test]
async fn heavy_contention_never_oversells() {
    let store = get_test_store().await;
    let item_id = seed_item(&store, 10).await;

    let attempts = (0..40).map(|i| {
        let store = store.clone();
        let item_id = item_id.clone();
        let quantity = (i % 3) + 1;
        tokio::spawn(async move { store.reserve(&item_id, quantity).await.map(|_| quantity) })
    });
    let reserved: u32 = join_all(attempts)
        .await
        .into_iter()
        .filter_map(|joined| joined.unwrap().ok())
        .sum();

    let remaining = store.get_item(&item_id).await.unwrap().unwrap().stock;
    assert!(reserved <= 10);
    assert_eq!(reserved + remaining, 10);
}

#[tokio::test]
async fn restore_returns_stock() {
    let store = get_test_store().await;
    let item_id = seed_item(&store, 2).await;

    store.reserve(&item_id, 2).await.unwrap();
    assert_eq!(store.restore(&item_id, 2).await.unwrap(), 2);
}

#[tokio::test]
async fn order_round_trip_and_status_axes() {
    let store = get_test_store().await;
    let item_id = seed_item(&store, 5).await;
    let customer = CustomerIdentity::new(format!("{}@example.com", Uuid::new_v4()));

    let order = Order::new(item_id, 2, customer.clone());
    let order_id = order.id;
    store.create_order(order).await.unwrap();

    let loaded = store.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(loaded.quantity, 2);
    assert_eq!(loaded.fulfillment_status, FulfillmentStatus::Pending);
    assert_eq!(loaded.payment_status, PaymentStatus::Unpaid);

    let paid = store.mark_paid(order_id).await.unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);

    let delivered = store
        .set_fulfillment_status(order_id, FulfillmentStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(delivered.fulfillment_status, FulfillmentStatus::Delivered);
    assert_eq!(delivered.payment_status, PaymentStatus::Paid);

    let listed = store.orders_for_customer(&customer).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, order_id);
}

#[tokio::test]
async fn updates_on_missing_order_fail() {
    let store = get_test_store().await;
    let err = store.mark_paid(OrderId::new()).await.unwrap_err();
    assert!(matches!(err, StoreError::OrderNotFound(_)));
}

#[tokio::test]
async fn duplicate_transaction_insert_is_rejected_by_the_key() {
    let store = get_test_store().await;
    let tx = unique_tx();
    let record = PaymentRecord::new(
        tx.clone(),
        OrderId::new(),
        Money::from_cents(4000),
        Currency::usd(),
    );

    assert_eq!(
        store.record(record.clone()).await.unwrap(),
        LedgerInsert::Inserted
    );
    assert_eq!(store.record(record).await.unwrap(), LedgerInsert::Duplicate);

    let stored = store.get_payment(&tx).await.unwrap().unwrap();
    assert_eq!(stored.amount.cents(), 4000);
    assert_eq!(stored.currency.as_str(), "usd");
}

#[tokio::test]
async fn concurrent_inserts_for_one_transaction_have_one_winner() {
    let store = get_test_store().await;
    let tx = unique_tx();
    let order_id = OrderId::new();

    let attempts = (0..8).map(|_| {
        let store = store.clone();
        let record = PaymentRecord::new(
            tx.clone(),
            order_id,
            Money::from_cents(1000),
            Currency::usd(),
        );
        tokio::spawn(async move { store.record(record).await })
    });
    let outcomes: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let inserted = outcomes
        .iter()
        .filter(|o| **o == LedgerInsert::Inserted)
        .count();
    assert_eq!(inserted, 1);
    assert_eq!(store.payments_for_order(order_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn reconciliation_tasks_round_trip_through_jsonb() {
    let store = get_test_store().await;
    let order_id = OrderId::new();
    let task = ReconciliationTask::new(
        TaskKind::OrderPaymentUpdateFailed {
            order_id,
            transaction_id: unique_tx(),
        },
        "order update failed",
    );
    let task_id = task.id;

    store.log_task(task.clone()).await.unwrap();

    let tasks = store.tasks().await.unwrap();
    let found = tasks.iter().find(|t| t.id == task_id).unwrap();
    assert_eq!(found.kind, task.kind);
    assert_eq!(found.detail, "order update failed");
}
