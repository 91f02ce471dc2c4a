//! Storage layer for the bookstore order pipeline.
//!
//! Every concurrency-sensitive guarantee lives here, inside a single store
//! primitive:
//! - [`InventoryLedger::reserve`] is one conditional decrement
//! - [`PaymentLedger::record`] is one unique-keyed insert
//!
//! Two implementations are provided: [`InMemoryStore`] for tests and local
//! runs, and [`PostgresStore`] for production.

pub mod error;
pub mod inventory;
pub mod memory;
pub mod orders;
pub mod payments;
pub mod postgres;
pub mod reconciliation;
pub mod store;

pub use error::{Result, StoreError};
pub use inventory::{InventoryLedger, Item};
pub use memory::InMemoryStore;
pub use orders::{Order, OrderStore};
pub use payments::{LedgerInsert, PaymentLedger, PaymentRecord};
pub use postgres::PostgresStore;
pub use reconciliation::{ReconciliationLog, ReconciliationTask, TaskKind};
pub use store::Store;
