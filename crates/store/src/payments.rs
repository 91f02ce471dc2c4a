//! Append-only ledger of confirmed payments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Currency, Money, OrderId, TransactionId};
use serde::{Deserialize, Serialize};

use crate::Result;

/// A confirmed payment. Never mutated or deleted once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub transaction_id: TransactionId,
    pub order_id: OrderId,
    pub amount: Money,
    pub currency: Currency,
    pub confirmed_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Creates a record stamped with the current time.
    pub fn new(
        transaction_id: TransactionId,
        order_id: OrderId,
        amount: Money,
        currency: Currency,
    ) -> Self {
        Self {
            transaction_id,
            order_id,
            amount,
            currency,
            confirmed_at: Utc::now(),
        }
    }
}

/// Outcome of a unique-keyed ledger insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerInsert {
    /// This call created the record.
    Inserted,
    /// A record with the same transaction id already existed; nothing was written.
    Duplicate,
}

/// Owner of payment records, keyed by transaction id.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Inserts a record unless one with the same transaction id exists.
    ///
    /// The uniqueness check and the insert are one store operation, so of
    /// any number of concurrent calls with the same transaction id exactly
    /// one observes `Inserted`.
    async fn record(&self, record: PaymentRecord) -> Result<LedgerInsert>;

    /// Loads the record for a transaction, if any.
    async fn get_payment(&self, transaction_id: &TransactionId) -> Result<Option<PaymentRecord>>;

    /// Lists every record referencing an order.
    async fn payments_for_order(&self, order_id: OrderId) -> Result<Vec<PaymentRecord>>;
}
