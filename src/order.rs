//! Order representation

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{OrderId, Price, Quantity, Side};

/// An order as carried by Add, Modify and Cancel events.
///
/// The book does not keep `Order` values around; it stores the resting
/// quantity per id inside each price level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub quantity: Quantity,
    pub price: Price,
}

impl Order {
    /// Create a new order.
    pub fn new(id: OrderId, side: Side, quantity: Quantity, price: Price) -> Self {
        Self {
            id,
            side,
            quantity,
            price,
        }
    }

    /// Same order with a different quantity.
    #[inline]
    pub fn with_quantity(self, quantity: Quantity) -> Self {
        Self { quantity, ..self }
    }
}

impl fmt::Display for Order {
    /// Wire payload without the event kind: `id,side,quantity,price`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.id, self.side, self.quantity, self.price)
    }
}
