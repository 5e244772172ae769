//! Trade representation

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Price, Quantity, Side};

/// A fill reported by the feed.
///
/// Feed trades carry no order ids, so a trade is not linked to any resting
/// order. The side is the side of the liquidity that was taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub side: Side,
    pub quantity: Quantity,
    pub price: Price,
}

impl Trade {
    /// Create a new trade.
    pub fn new(side: Side, quantity: Quantity, price: Price) -> Self {
        Self {
            side,
            quantity,
            price,
        }
    }
}

impl fmt::Display for Trade {
    /// Wire payload without the event kind: `side,quantity,price`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.side, self.quantity, self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_wire_payload() {
        let trade = Trade::new(Side::Sell, 3, "1050".parse().unwrap());
        assert_eq!(trade.to_string(), "S,3,1050");
    }
}
