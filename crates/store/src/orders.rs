//! Order documents.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerIdentity, FulfillmentStatus, ItemId, OrderId, PaymentStatus};
use serde::{Deserialize, Serialize};

use crate::Result;

/// An order for a quantity of one item.
///
/// `item_id`, `quantity` and `customer` never change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub item_id: ItemId,
    pub quantity: u32,
    pub customer: CustomerIdentity,
    pub fulfillment_status: FulfillmentStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new order in `{pending, unpaid}`.
    pub fn new(item_id: ItemId, quantity: u32, customer: CustomerIdentity) -> Self {
        Self {
            id: OrderId::new(),
            item_id,
            quantity,
            customer,
            fulfillment_status: FulfillmentStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            created_at: Utc::now(),
        }
    }
}

/// Owner of order documents.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a newly created order.
    async fn create_order(&self, order: Order) -> Result<()>;

    /// Loads an order. Returns None if it does not exist.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Lists a customer's orders, oldest first.
    async fn orders_for_customer(&self, customer: &CustomerIdentity) -> Result<Vec<Order>>;

    /// Sets the fulfillment status, leaving payment status untouched.
    async fn set_fulfillment_status(
        &self,
        order_id: OrderId,
        status: FulfillmentStatus,
    ) -> Result<Order>;

    /// Sets the payment status to paid. Idempotent; there is no way back to unpaid.
    async fn mark_paid(&self, order_id: OrderId) -> Result<Order>;
}
