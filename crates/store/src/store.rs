use crate::{InventoryLedger, OrderStore, PaymentLedger, ReconciliationLog};

/// A backing store providing every ledger the pipeline needs.
///
/// Blanket-implemented for anything that implements all four traits and can
/// be cheaply cloned into services.
pub trait Store:
    InventoryLedger + OrderStore + PaymentLedger + ReconciliationLog + Clone + 'static
{
}

impl<T> Store for T where
    T: InventoryLedger + OrderStore + PaymentLedger + ReconciliationLog + Clone + 'static
{
}
