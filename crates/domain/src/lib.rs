//! Domain layer for the bookstore order pipeline.
//!
//! This crate provides:
//! - `OrderService`, which places orders against the inventory ledger and
//!   compensates the reservation when the order cannot be recorded
//! - the place-order and fulfillment-update commands
//! - the domain error taxonomy

pub mod error;
pub mod order;

pub use error::DomainError;
pub use order::{OrderError, OrderService, PlaceOrder, UpdateFulfillmentStatus};
pub use store::Order;
