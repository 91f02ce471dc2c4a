//! Order commands.

use common::{CustomerIdentity, FulfillmentStatus, ItemId, OrderId};

use super::OrderError;

/// Command to place an order for a quantity of one item.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    /// The item being ordered.
    pub item_id: ItemId,

    /// How many copies to reserve.
    pub quantity: u32,

    /// Who is ordering.
    pub customer: CustomerIdentity,
}

impl PlaceOrder {
    /// Creates a new PlaceOrder command.
    pub fn new(
        item_id: impl Into<ItemId>,
        quantity: u32,
        customer: impl Into<CustomerIdentity>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
            customer: customer.into(),
        }
    }

    /// Checks the command's own preconditions.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.quantity == 0 {
            return Err(OrderError::InvalidQuantity {
                quantity: self.quantity,
            });
        }
        Ok(())
    }
}

/// Command to move an order along the fulfillment axis.
#[derive(Debug, Clone)]
pub struct UpdateFulfillmentStatus {
    /// The order to update.
    pub order_id: OrderId,

    /// The new fulfillment status.
    pub status: FulfillmentStatus,
}

impl UpdateFulfillmentStatus {
    /// Creates a new UpdateFulfillmentStatus command.
    pub fn new(order_id: OrderId, status: FulfillmentStatus) -> Self {
        Self { order_id, status }
    }

    /// Builds the command from a status string supplied by a caller.
    ///
    /// Anything other than `pending`, `delivered` or `cancelled` is rejected.
    pub fn parse(order_id: OrderId, status: &str) -> Result<Self, OrderError> {
        let status = status
            .parse::<FulfillmentStatus>()
            .map_err(|e| OrderError::InvalidStatus { value: e.value })?;
        Ok(Self::new(order_id, status))
    }
}
