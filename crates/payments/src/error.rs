//! Payment error types.

use common::{OrderId, SessionRef};
use domain::DomainError;
use store::StoreError;
use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors that can occur during checkout or confirmation.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The gateway has no session with this reference.
    #[error("Checkout session not found: {0}")]
    SessionNotFound(SessionRef),

    /// The gateway could not be reached or failed internally.
    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// The gateway refused the request.
    #[error("Payment gateway rejected the request: {0}")]
    GatewayRejected(String),

    /// The amount is not a positive number of minor units.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Checkout needs a description to name the line item.
    #[error("Checkout description is required")]
    MissingDescription,

    /// A paid session lacks a field confirmation depends on.
    #[error("Malformed checkout session: {0}")]
    MalformedSession(String),

    /// The referenced order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order has already been paid for.
    #[error("Order already paid: {0}")]
    OrderAlreadyPaid(OrderId),

    /// The payment was recorded but the order could not be updated. The
    /// details are in the reconciliation log; callers only see a generic failure.
    #[error("Internal inconsistency recorded for reconciliation")]
    Inconsistency { detail: String },

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(DomainError),
}

impl From<DomainError> for PaymentError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::OrderNotFound(order_id) => PaymentError::OrderNotFound(order_id),
            DomainError::Store(e) => PaymentError::Store(e),
            other => PaymentError::Domain(other),
        }
    }
}

impl From<GatewayError> for PaymentError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::SessionNotFound(session) => PaymentError::SessionNotFound(session),
            GatewayError::Unavailable(msg) => PaymentError::GatewayUnavailable(msg),
            GatewayError::Rejected(msg) => PaymentError::GatewayRejected(msg),
            GatewayError::Decode(msg) => PaymentError::MalformedSession(msg),
        }
    }
}

/// Convenience type alias for payment results.
pub type Result<T> = std::result::Result<T, PaymentError>;
