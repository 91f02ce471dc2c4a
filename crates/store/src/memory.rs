use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::{CustomerIdentity, FulfillmentStatus, ItemId, OrderId, PaymentStatus, TransactionId};
use tokio::sync::RwLock;

use crate::{
    InventoryLedger, Item, LedgerInsert, Order, OrderStore, PaymentLedger, PaymentRecord,
    ReconciliationLog, ReconciliationTask, Result, StoreError,
};

#[derive(Debug, Default)]
struct Faults {
    create_order: AtomicBool,
    restore: AtomicBool,
    mark_paid: AtomicBool,
    log_task: AtomicBool,
}

impl Faults {
    fn check(flag: &AtomicBool, operation: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{operation} failed")));
        }
        Ok(())
    }
}

/// In-memory store implementation for testing and local runs.
///
/// Each conditional operation runs entirely under one write lock, which
/// gives the same all-or-nothing behaviour as the PostgreSQL statements.
/// Individual operations can be made to fail to exercise compensation paths.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    items: Arc<RwLock<HashMap<ItemId, Item>>>,
    orders: Arc<RwLock<Vec<Order>>>,
    payments: Arc<RwLock<HashMap<TransactionId, PaymentRecord>>>,
    tasks: Arc<RwLock<Vec<ReconciliationTask>>>,
    faults: Arc<Faults>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `create_order` fail until reset.
    pub fn set_fail_on_create_order(&self, fail: bool) {
        self.faults.create_order.store(fail, Ordering::SeqCst);
    }

    /// Makes `restore` fail until reset.
    pub fn set_fail_on_restore(&self, fail: bool) {
        self.faults.restore.store(fail, Ordering::SeqCst);
    }

    /// Makes `mark_paid` fail until reset.
    pub fn set_fail_on_mark_paid(&self, fail: bool) {
        self.faults.mark_paid.store(fail, Ordering::SeqCst);
    }

    /// Makes `log_task` fail until reset.
    pub fn set_fail_on_log_task(&self, fail: bool) {
        self.faults.log_task.store(fail, Ordering::SeqCst);
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Returns the total number of payment records stored.
    pub async fn payment_count(&self) -> usize {
        self.payments.read().await.len()
    }
}

#[async_trait]
impl InventoryLedger for InMemoryStore {
    async fn reserve(&self, item_id: &ItemId, quantity: u32) -> Result<u32> {
        if quantity == 0 {
            return Err(StoreError::InvalidQuantity(quantity));
        }

        let mut items = self.items.write().await;
        let item = items
            .get_mut(item_id)
            .ok_or_else(|| StoreError::ItemNotFound(item_id.clone()))?;

        if item.stock < quantity {
            return Err(StoreError::InsufficientStock {
                item_id: item_id.clone(),
                available: item.stock,
                requested: quantity,
            });
        }

        item.stock -= quantity;
        Ok(item.stock)
    }

    async fn restore(&self, item_id: &ItemId, quantity: u32) -> Result<u32> {
        Faults::check(&self.faults.restore, "restore")?;
        if quantity == 0 {
            return Err(StoreError::InvalidQuantity(quantity));
        }

        let mut items = self.items.write().await;
        let item = items
            .get_mut(item_id)
            .ok_or_else(|| StoreError::ItemNotFound(item_id.clone()))?;

        item.stock = item.stock.checked_add(quantity).ok_or_else(|| {
            StoreError::InvalidData(format!("stock overflow restoring item {item_id}"))
        })?;
        Ok(item.stock)
    }

    async fn upsert_item(&self, item: Item) -> Result<()> {
        self.items.write().await.insert(item.id.clone(), item);
        Ok(())
    }

    async fn get_item(&self, item_id: &ItemId) -> Result<Option<Item>> {
        Ok(self.items.read().await.get(item_id).cloned())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create_order(&self, order: Order) -> Result<()> {
        Faults::check(&self.faults.create_order, "create_order")?;
        self.orders.write().await.push(order);
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.iter().find(|o| o.id == order_id).cloned())
    }

    async fn orders_for_customer(&self, customer: &CustomerIdentity) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matching: Vec<_> = orders
            .iter()
            .filter(|o| &o.customer == customer)
            .cloned()
            .collect();
        matching.sort_by_key(|o| o.created_at);
        Ok(matching)
    }

    async fn set_fulfillment_status(
        &self,
        order_id: OrderId,
        status: FulfillmentStatus,
    ) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let order = orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        order.fulfillment_status = status;
        Ok(order.clone())
    }

    async fn mark_paid(&self, order_id: OrderId) -> Result<Order> {
        Faults::check(&self.faults.mark_paid, "mark_paid")?;
        let mut orders = self.orders.write().await;
        let order = orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        order.payment_status = PaymentStatus::Paid;
        Ok(order.clone())
    }
}

#[async_trait]
impl PaymentLedger for InMemoryStore {
    async fn record(&self, record: PaymentRecord) -> Result<LedgerInsert> {
        use std::collections::hash_map::Entry;

        let mut payments = self.payments.write().await;
        match payments.entry(record.transaction_id.clone()) {
            Entry::Occupied(_) => Ok(LedgerInsert::Duplicate),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(LedgerInsert::Inserted)
            }
        }
    }

    async fn get_payment(&self, transaction_id: &TransactionId) -> Result<Option<PaymentRecord>> {
        Ok(self.payments.read().await.get(transaction_id).cloned())
    }

    async fn payments_for_order(&self, order_id: OrderId) -> Result<Vec<PaymentRecord>> {
        let payments = self.payments.read().await;
        let mut matching: Vec<_> = payments
            .values()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect();
        matching.sort_by_key(|p| p.confirmed_at);
        Ok(matching)
    }
}

#[async_trait]
impl ReconciliationLog for InMemoryStore {
    async fn log_task(&self, task: ReconciliationTask) -> Result<()> {
        Faults::check(&self.faults.log_task, "log_task")?;
        self.tasks.write().await.push(task);
        Ok(())
    }

    async fn tasks(&self) -> Result<Vec<ReconciliationTask>> {
        Ok(self.tasks.read().await.clone())
    }
}
