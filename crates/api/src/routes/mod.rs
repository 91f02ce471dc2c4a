//! HTTP route handlers.

pub mod checkout;
pub mod health;
pub mod items;
pub mod metrics;
pub mod orders;
pub mod reconciliation;

use std::sync::Arc;

use common::{Currency, OrderId};
use domain::OrderService;
use payments::{PaymentGateway, PaymentReconciler};
use store::Store;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub order_service: OrderService<S>,
    pub reconciler: PaymentReconciler<S, Arc<dyn PaymentGateway>>,
    pub store: S,
    /// Currency used when a checkout request does not name one.
    pub currency: Currency,
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    OrderId::parse(id).map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))
}
