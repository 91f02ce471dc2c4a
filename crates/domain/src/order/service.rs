//! Order service: places orders against the inventory ledger.

use common::{CustomerIdentity, ItemId, OrderId};
use store::{
    InventoryLedger, Order, OrderStore, ReconciliationLog, ReconciliationTask, Store, StoreError,
    TaskKind,
};

use crate::error::DomainError;

use super::{OrderError, PlaceOrder, UpdateFulfillmentStatus};

/// Service for placing and tracking orders.
///
/// Placing an order is a two-step saga across stores with no shared
/// transaction: reserve stock, then record the order. If recording fails
/// the reservation is restored; if restoring fails too, the discrepancy is
/// written to the reconciliation log.
#[derive(Clone)]
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reserves stock and records a `{pending, unpaid}` order.
    ///
    /// On a rejected reservation nothing is written. On a failed order write
    /// the reservation is compensated before the error is returned.
    #[tracing::instrument(skip(self, cmd), fields(item_id = %cmd.item_id, quantity = cmd.quantity))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<Order, DomainError> {
        cmd.validate()?;

        let remaining = match self.store.reserve(&cmd.item_id, cmd.quantity).await {
            Ok(remaining) => remaining,
            Err(e) => {
                let err = reservation_error(e);
                if let DomainError::Order(ref rejection) = err {
                    metrics::counter!("stock_reservations_rejected_total").increment(1);
                    tracing::warn!(reason = %rejection, "reservation rejected");
                }
                return Err(err);
            }
        };

        let order = Order::new(cmd.item_id.clone(), cmd.quantity, cmd.customer);
        if let Err(create_err) = self.store.create_order(order.clone()).await {
            tracing::warn!(
                error = %create_err,
                "order write failed after reservation, restoring stock"
            );
            self.compensate_reservation(&cmd.item_id, cmd.quantity, &create_err)
                .await?;
            return Err(create_err.into());
        }

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(order_id = %order.id, remaining, "order placed");
        Ok(order)
    }

    /// Restores a reservation whose order was never recorded.
    async fn compensate_reservation(
        &self,
        item_id: &ItemId,
        quantity: u32,
        cause: &StoreError,
    ) -> Result<(), DomainError> {
        metrics::counter!("order_compensations_total").increment(1);

        match self.store.restore(item_id, quantity).await {
            Ok(stock) => {
                tracing::info!(%item_id, quantity, stock, "reservation restored");
                Ok(())
            }
            Err(restore_err) => {
                let detail = format!(
                    "order write failed ({cause}); \
                     restoring {quantity} of item {item_id} failed ({restore_err})"
                );
                self.store
                    .report(ReconciliationTask::new(
                        TaskKind::StockRestoreFailed {
                            item_id: item_id.clone(),
                            quantity,
                        },
                        detail.clone(),
                    ))
                    .await;
                Err(DomainError::CompensationFailed { detail })
            }
        }
    }

    /// Sets an order's fulfillment status. Payment status is never touched.
    #[tracing::instrument(skip(self))]
    pub async fn update_fulfillment_status(
        &self,
        cmd: UpdateFulfillmentStatus,
    ) -> Result<Order, DomainError> {
        let order = self
            .store
            .set_fulfillment_status(cmd.order_id, cmd.status)
            .await
            .map_err(|e| match e {
                StoreError::OrderNotFound(id) => DomainError::OrderNotFound(id),
                other => DomainError::Store(other),
            })?;

        tracing::info!(
            order_id = %order.id,
            status = %order.fulfillment_status,
            "fulfillment status updated"
        );
        Ok(order)
    }

    /// Loads an order by ID.
    ///
    /// Returns None if the order doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, DomainError> {
        Ok(self.store.get_order(order_id).await?)
    }

    /// Loads an order by ID, failing if it doesn't exist.
    pub async fn require_order(&self, order_id: OrderId) -> Result<Order, DomainError> {
        self.get_order(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))
    }

    /// Lists a customer's orders, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_customer(
        &self,
        customer: &CustomerIdentity,
    ) -> Result<Vec<Order>, DomainError> {
        Ok(self.store.orders_for_customer(customer).await?)
    }
}

/// Turns reservation rejections into business errors; everything else is a fault.
fn reservation_error(err: StoreError) -> DomainError {
    match err {
        StoreError::ItemNotFound(item_id) => OrderError::ItemNotFound { item_id }.into(),
        StoreError::InsufficientStock {
            item_id,
            available,
            requested,
        } => OrderError::InsufficientStock {
            item_id,
            available,
            requested,
        }
        .into(),
        StoreError::InvalidQuantity(quantity) => OrderError::InvalidQuantity { quantity }.into(),
        other => DomainError::Store(other),
    }
}
