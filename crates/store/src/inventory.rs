//! Per-item stock counters.

use async_trait::async_trait;
use common::{ItemId, Money};
use serde::{Deserialize, Serialize};

use crate::Result;

/// A stocked catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub stock: u32,
    pub price: Money,
}

impl Item {
    /// Creates a new item record.
    pub fn new(id: impl Into<ItemId>, stock: u32, price: Money) -> Self {
        Self {
            id: id.into(),
            stock,
            price,
        }
    }
}

/// Owner of per-item stock counts.
///
/// Stock never goes negative. Implementations must enforce that inside the
/// decrement itself, never by reading first and writing afterwards.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Atomically decrements stock by `quantity` if and only if at least
    /// `quantity` is available.
    ///
    /// Returns the stock left after the decrement. Fails with
    /// `ItemNotFound`, `InsufficientStock` or `InvalidQuantity`; on failure
    /// the counter is untouched.
    async fn reserve(&self, item_id: &ItemId, quantity: u32) -> Result<u32>;

    /// Atomically adds `quantity` back to an item's stock.
    ///
    /// Used to compensate a reservation whose order could not be recorded.
    async fn restore(&self, item_id: &ItemId, quantity: u32) -> Result<u32>;

    /// Creates an item or replaces its stock and price.
    async fn upsert_item(&self, item: Item) -> Result<()>;

    /// Loads an item. Returns None if it does not exist.
    async fn get_item(&self, item_id: &ItemId) -> Result<Option<Item>>;
}
