//! Integration tests for order placement.
//!
//! These tests drive `OrderService` concurrently against one shared store
//! to check that stock never goes negative and that failed placements leave
//! nothing behind.

use common::{CustomerIdentity, ItemId, Money};
use domain::{DomainError, OrderError, OrderService, PlaceOrder};
use futures_util::future::join_all;
use store::{InMemoryStore, InventoryLedger, Item};

async fn create_service(stock: u32) -> OrderService<InMemoryStore> {
    let store = InMemoryStore::new();
    store
        .upsert_item(Item::new("book-1", stock, Money::from_cents(1500)))
        .await
        .unwrap();
    OrderService::new(store)
}

async fn stock_of(service: &OrderService<InMemoryStore>) -> u32 {
    service
        .store()
        .get_item(&ItemId::new("book-1"))
        .await
        .unwrap()
        .unwrap()
        .stock
}

mod contention {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn last_copy_goes_to_exactly_one_customer() {
        let service = create_service(1).await;

        let attempts = ["a@example.com", "b@example.com"].map(|email| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .place_order(PlaceOrder::new("book-1", 1, email))
                    .await
            })
        });
        let results: Vec<_> = join_all(attempts)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(
                    r,
                    Err(DomainError::Order(OrderError::InsufficientStock { .. }))
                ))
                .count(),
            1
        );
        assert_eq!(stock_of(&service).await, 0);
        assert_eq!(service.store().order_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn many_concurrent_orders_never_oversell() {
        let initial = 25;
        let service = create_service(initial).await;

        let attempts = (0..100u32).map(|i| {
            let service = service.clone();
            let quantity = (i % 4) + 1;
            tokio::spawn(async move {
                service
                    .place_order(PlaceOrder::new(
                        "book-1",
                        quantity,
                        format!("reader{i}@example.com"),
                    ))
                    .await
            })
        });
        let placed: Vec<_> = join_all(attempts)
            .await
            .into_iter()
            .filter_map(|joined| joined.unwrap().ok())
            .collect();

        let reserved: u32 = placed.iter().map(|o| o.quantity).sum();
        let remaining = stock_of(&service).await;

        assert!(reserved <= initial);
        assert_eq!(reserved + remaining, initial);
        assert_eq!(service.store().order_count().await, placed.len());
    }
}

mod lookups {
    use super::*;

    #[tokio::test]
    async fn orders_are_listed_per_customer() {
        let service = create_service(10).await;

        for email in ["a@example.com", "b@example.com", "a@example.com"] {
            service
                .place_order(PlaceOrder::new("book-1", 1, email))
                .await
                .unwrap();
        }

        let a_orders = service
            .orders_for_customer(&CustomerIdentity::new("a@example.com"))
            .await
            .unwrap();
        assert_eq!(a_orders.len(), 2);
        assert!(a_orders.windows(2).all(|w| w[0].created_at <= w[1].created_at));

        let none = service
            .orders_for_customer(&CustomerIdentity::new("c@example.com"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn require_order_reports_missing_orders() {
        let service = create_service(1).await;
        let err = service
            .require_order(common::OrderId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::OrderNotFound(_)));
    }
}
