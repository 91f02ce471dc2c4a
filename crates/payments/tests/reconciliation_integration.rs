//! Integration tests for checkout and payment reconciliation.

use common::{
    Currency, CustomerIdentity, ItemId, Money, OrderId, PaymentStatus, SessionRef, TransactionId,
};
use domain::{DomainError, OrderError, OrderService, PlaceOrder};
use futures_util::future::join_all;
use payments::{
    CheckoutUrls, InMemoryPaymentGateway, PaymentError, PaymentReconciler, ReconciliationOutcome,
    SessionStatus, StartCheckout,
};
use store::{InMemoryStore, InventoryLedger, Item, OrderStore, PaymentLedger, ReconciliationLog};

type TestReconciler = PaymentReconciler<InMemoryStore, InMemoryPaymentGateway>;

struct TestHarness {
    store: InMemoryStore,
    gateway: InMemoryPaymentGateway,
    order_service: OrderService<InMemoryStore>,
    reconciler: TestReconciler,
}

impl TestHarness {
    async fn with_stock(stock: u32) -> Self {
        let store = InMemoryStore::new();
        store
            .upsert_item(Item::new("dune", stock, Money::from_cents(2000)))
            .await
            .unwrap();

        let gateway = InMemoryPaymentGateway::new();
        let reconciler = PaymentReconciler::new(
            store.clone(),
            gateway.clone(),
            CheckoutUrls::for_site("http://localhost:5173"),
        );

        Self {
            order_service: OrderService::new(store.clone()),
            store,
            gateway,
            reconciler,
        }
    }

    async fn place(&self, quantity: u32) -> Result<OrderId, DomainError> {
        self.order_service
            .place_order(PlaceOrder::new("dune", quantity, "reader@example.com"))
            .await
            .map(|order| order.id)
    }

    async fn checkout(&self, order_id: OrderId, cents: i64) -> SessionRef {
        self.reconciler
            .start_checkout(StartCheckout {
                order_id,
                amount: Money::from_cents(cents),
                currency: Currency::usd(),
                customer: CustomerIdentity::new("reader@example.com"),
                description: "Dune".to_string(),
            })
            .await
            .unwrap()
            .session_id
    }

    async fn stock(&self) -> u32 {
        self.store
            .get_item(&ItemId::new("dune"))
            .await
            .unwrap()
            .unwrap()
            .stock
    }

    async fn payment_status(&self, order_id: OrderId) -> PaymentStatus {
        self.store
            .get_order(order_id)
            .await
            .unwrap()
            .unwrap()
            .payment_status
    }
}

#[tokio::test]
async fn test_order_to_payment_end_to_end() {
    let h = TestHarness::with_stock(3).await;

    // First order takes two of three copies.
    let order_id = h.place(2).await.unwrap();
    assert_eq!(h.stock().await, 1);

    // Second order for two is rejected and leaves nothing behind.
    let err = h.place(2).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::Order(OrderError::InsufficientStock {
            available: 1,
            requested: 2,
            ..
        })
    ));
    assert_eq!(h.stock().await, 1);
    assert_eq!(h.store.order_count().await, 1);

    // Checkout and pay.
    let session = h.checkout(order_id, 4000).await;
    let tx = h.gateway.complete_session(&session).unwrap();

    let outcome = h.reconciler.confirm(&session).await.unwrap();
    assert_eq!(
        outcome,
        ReconciliationOutcome::Recorded {
            order_id,
            transaction_id: tx.clone(),
            amount: Money::from_cents(4000),
            currency: Currency::usd(),
        }
    );
    assert_eq!(h.payment_status(order_id).await, PaymentStatus::Paid);

    // Replaying the confirmation is a no-op.
    let replay = h.reconciler.confirm(&session).await.unwrap();
    assert_eq!(
        replay,
        ReconciliationOutcome::AlreadyRecorded {
            order_id,
            transaction_id: tx,
        }
    );
    assert_eq!(h.store.payments_for_order(order_id).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_confirms_record_exactly_once() {
    let h = TestHarness::with_stock(3).await;
    let order_id = h.place(1).await.unwrap();
    let session = h.checkout(order_id, 2000).await;
    h.gateway.complete_session(&session).unwrap();

    let attempts = (0..16).map(|_| {
        let reconciler = h.reconciler.clone();
        let session = session.clone();
        tokio::spawn(async move { reconciler.confirm(&session).await })
    });
    let outcomes: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let recorded = outcomes
        .iter()
        .filter(|o| matches!(o, ReconciliationOutcome::Recorded { .. }))
        .count();
    let duplicates = outcomes
        .iter()
        .filter(|o| matches!(o, ReconciliationOutcome::AlreadyRecorded { .. }))
        .count();

    assert_eq!(recorded, 1);
    assert_eq!(duplicates, 15);
    assert_eq!(h.store.payment_count().await, 1);
    assert_eq!(h.payment_status(order_id).await, PaymentStatus::Paid);
}

#[tokio::test]
async fn test_paid_order_never_reverts() {
    let h = TestHarness::with_stock(3).await;
    let order_id = h.place(1).await.unwrap();
    let session = h.checkout(order_id, 2000).await;
    h.gateway.complete_session(&session).unwrap();
    h.reconciler.confirm(&session).await.unwrap();

    // The provider later reports the session differently; the order stays paid.
    assert!(h.gateway.set_status(&session, SessionStatus::Expired));
    let outcome = h.reconciler.confirm(&session).await.unwrap();
    assert_eq!(
        outcome,
        ReconciliationOutcome::NotPaid {
            status: SessionStatus::Expired
        }
    );
    assert_eq!(h.payment_status(order_id).await, PaymentStatus::Paid);
    assert_eq!(h.store.payment_count().await, 1);
}

#[tokio::test]
async fn test_distinct_transactions_for_one_order_are_both_recorded() {
    let h = TestHarness::with_stock(3).await;
    let order_id = h.place(1).await.unwrap();

    let first = h.checkout(order_id, 2000).await;
    let second = h.checkout(order_id, 2000).await;
    assert!(h.gateway.complete_session_with(&first, TransactionId::new("pi_first")));
    assert!(h.gateway.complete_session_with(&second, TransactionId::new("pi_second")));

    assert!(matches!(
        h.reconciler.confirm(&first).await.unwrap(),
        ReconciliationOutcome::Recorded { .. }
    ));
    assert!(matches!(
        h.reconciler.confirm(&second).await.unwrap(),
        ReconciliationOutcome::Recorded { .. }
    ));
    assert_eq!(h.store.payments_for_order(order_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_confirm_unknown_session() {
    let h = TestHarness::with_stock(1).await;
    let err = h
        .reconciler
        .confirm(&SessionRef::new("cs_test_9999"))
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::SessionNotFound(_)));
}

#[tokio::test]
async fn test_gateway_outage_during_confirm_is_not_retried() {
    let h = TestHarness::with_stock(1).await;
    let order_id = h.place(1).await.unwrap();
    let session = h.checkout(order_id, 2000).await;
    h.gateway.complete_session(&session).unwrap();
    h.gateway.set_unavailable(true);

    let calls_before = h.gateway.get_session_calls();
    let err = h.reconciler.confirm(&session).await.unwrap_err();
    assert!(matches!(err, PaymentError::GatewayUnavailable(_)));
    assert_eq!(h.gateway.get_session_calls(), calls_before + 1);
    assert_eq!(h.store.payment_count().await, 0);

    // Once the provider is back the same confirmation goes through.
    h.gateway.set_unavailable(false);
    assert!(matches!(
        h.reconciler.confirm(&session).await.unwrap(),
        ReconciliationOutcome::Recorded { .. }
    ));
}

#[tokio::test]
async fn test_failed_order_update_can_be_found_by_operators() {
    let h = TestHarness::with_stock(1).await;
    let order_id = h.place(1).await.unwrap();
    let session = h.checkout(order_id, 2000).await;
    h.gateway.complete_session(&session).unwrap();
    h.store.set_fail_on_mark_paid(true);

    let err = h.reconciler.confirm(&session).await.unwrap_err();
    assert!(matches!(err, PaymentError::Inconsistency { .. }));

    // A retry sees the recorded transaction and does not double count.
    h.store.set_fail_on_mark_paid(false);
    assert!(matches!(
        h.reconciler.confirm(&session).await.unwrap(),
        ReconciliationOutcome::AlreadyRecorded { .. }
    ));
    assert_eq!(h.store.payment_count().await, 1);
    assert_eq!(h.store.tasks().await.unwrap().len(), 1);
}
