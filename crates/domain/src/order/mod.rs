//! Order placement and fulfillment.

mod commands;
mod service;

pub use commands::{PlaceOrder, UpdateFulfillmentStatus};
pub use service::OrderService;

use common::ItemId;
use thiserror::Error;

/// Business-rule rejections for order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Quantities must be at least one.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// The item does not exist.
    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: ItemId },

    /// Not enough stock to cover the order.
    #[error("Only {available} left in stock for {item_id}, {requested} requested")]
    InsufficientStock {
        item_id: ItemId,
        available: u32,
        requested: u32,
    },

    /// The status value is not one of the legal fulfillment statuses.
    #[error("Invalid fulfillment status: {value:?} (expected pending, delivered or cancelled)")]
    InvalidStatus { value: String },
}
