//! Durable log of discrepancies that need operator follow-up.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ItemId, OrderId, TransactionId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskKind {
    /// A reservation was taken but the order was never recorded, and putting
    /// the stock back failed too.
    StockRestoreFailed { item_id: ItemId, quantity: u32 },

    /// The payment is in the ledger but the order is still marked unpaid.
    OrderPaymentUpdateFailed {
        order_id: OrderId,
        transaction_id: TransactionId,
    },
}

/// One entry in the reconciliation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationTask {
    pub id: Uuid,
    pub kind: TaskKind,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

impl ReconciliationTask {
    /// Creates a task stamped with the current time.
    pub fn new(kind: TaskKind, detail: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            detail: detail.into(),
            created_at: Utc::now(),
        }
    }
}

/// Append-only sink for reconciliation tasks.
#[async_trait]
pub trait ReconciliationLog: Send + Sync {
    /// Appends a task.
    async fn log_task(&self, task: ReconciliationTask) -> Result<()>;

    /// Lists all tasks, oldest first.
    async fn tasks(&self) -> Result<Vec<ReconciliationTask>>;

    /// Appends a task, falling back to an error-level trace when the log
    /// itself cannot be written. Never fails.
    async fn report(&self, task: ReconciliationTask) {
        tracing::error!(
            task_id = %task.id,
            kind = ?task.kind,
            detail = %task.detail,
            "reconciliation required"
        );
        metrics::counter!("reconciliation_tasks_logged_total").increment(1);

        let task_id = task.id;
        if let Err(e) = self.log_task(task).await {
            tracing::error!(
                %task_id,
                error = %e,
                "failed to persist reconciliation task; the trace above is the only record"
            );
        }
    }
}
