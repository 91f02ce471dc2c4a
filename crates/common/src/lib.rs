//! Shared types for the bookstore order pipeline.
//!
//! Identifiers, money amounts, and the two independent order status axes
//! used by every other crate in the workspace.

pub mod money;
pub mod status;
pub mod types;

pub use money::{Currency, Money, MoneyError};
pub use status::{FulfillmentStatus, PaymentStatus, StatusParseError};
pub use types::{CustomerIdentity, ItemId, OrderId, SessionRef, TransactionId};
