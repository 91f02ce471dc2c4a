//! Domain error types.

use common::OrderId;
use store::StoreError;
use thiserror::Error;

use crate::order::OrderError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A business rule rejected the operation.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// A partially applied operation could not be undone. The details are in
    /// the reconciliation log; callers only see a generic failure.
    #[error("Internal inconsistency recorded for reconciliation")]
    CompensationFailed { detail: String },
}
