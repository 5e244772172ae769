//! Feed events and deterministic replay.
//!
//! An [`Event`] is one decoded wire line. Applying the same events to a fresh
//! book always produces the same resting state, which is how a consumer
//! rebuilds the book a generator built.

use std::fmt;

use crate::codec::EventKind;
use crate::error::BookStateError;
use crate::{Order, OrderBook, Trade};

/// One book-mutation event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Rest a new order
    Add(Order),
    /// Replace the resting quantity of an order
    Modify(Order),
    /// Reduce or remove a resting order
    Cancel(Order),
    /// A reported fill
    Trade(Trade),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Add(_) => EventKind::Add,
            Event::Modify(_) => EventKind::Modify,
            Event::Cancel(_) => EventKind::Cancel,
            Event::Trade(_) => EventKind::Trade,
        }
    }

    /// The order carried by Add, Modify and Cancel.
    pub fn order(&self) -> Option<&Order> {
        match self {
            Event::Add(o) | Event::Modify(o) | Event::Cancel(o) => Some(o),
            Event::Trade(_) => None,
        }
    }
}

impl fmt::Display for Event {
    /// The wire line, without a line terminator.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Add(o) | Event::Modify(o) | Event::Cancel(o) => {
                write!(f, "{},{}", self.kind(), o)
            }
            Event::Trade(t) => write!(f, "{},{}", self.kind(), t),
        }
    }
}

impl OrderBook {
    /// Apply a single decoded event.
    pub fn apply(&mut self, event: &Event) -> Result<(), BookStateError> {
        match *event {
            Event::Add(order) => self.add(order),
            Event::Modify(o) => self.modify(o.id, o.side, o.price, o.quantity),
            Event::Cancel(o) => self.cancel(o.id, o.side, o.price, o.quantity),
            Event::Trade(trade) => {
                self.trade(trade);
                Ok(())
            }
        }
    }

    /// Apply events in order. Rejected events are counted and skipped.
    ///
    /// Returns the number of rejected events.
    pub fn apply_all(&mut self, events: &[Event]) -> usize {
        events.iter().filter(|e| self.apply(e).is_err()).count()
    }

    /// Build a fresh book from a sequence of events.
    pub fn replay(events: &[Event]) -> Self {
        let mut book = OrderBook::new();
        book.apply_all(events);
        book
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;
    use crate::{OrderId, Price, Side};

    fn p(v: i64) -> Price {
        Price::from(v)
    }

    #[test]
    fn display_is_wire_line() {
        let order = Order::new(OrderId(12), Side::Buy, 5, "912.50".parse().unwrap());
        assert_eq!(Event::Add(order).to_string(), "A,12,B,5,912.5");
        assert_eq!(Event::Modify(order).to_string(), "M,12,B,5,912.5");
        assert_eq!(Event::Cancel(order).to_string(), "X,12,B,5,912.5");
        assert_eq!(
            Event::Trade(Trade::new(Side::Sell, 1, p(1050))).to_string(),
            "T,S,1,1050"
        );
    }

    #[test]
    fn display_decodes_back() {
        let line = "X,3,S,40,1100";
        assert_eq!(decode(line).unwrap().to_string(), line);
    }

    #[test]
    fn apply_routes_to_book() {
        let mut book = OrderBook::new();
        let order = Order::new(OrderId(1), Side::Sell, 10, p(100));

        book.apply(&Event::Add(order)).unwrap();
        book.apply(&Event::Modify(order.with_quantity(4))).unwrap();
        assert_eq!(book.order(OrderId(1)).unwrap().quantity, 4);

        book.apply(&Event::Trade(Trade::new(Side::Sell, 2, p(100))))
            .unwrap();
        assert_eq!(book.traded_quantity_at(p(100)), 2);

        book.apply(&Event::Cancel(order.with_quantity(4))).unwrap();
        assert!(book.asks().is_empty());

        assert_eq!(
            book.apply(&Event::Cancel(order)),
            Err(BookStateError::MissingPriceLevel)
        );
    }

    #[test]
    fn replay_matches_incremental() {
        let events = [
            Event::Add(Order::new(OrderId(1), Side::Buy, 10, p(99))),
            Event::Add(Order::new(OrderId(2), Side::Sell, 10, p(101))),
            Event::Add(Order::new(OrderId(3), Side::Buy, 3, p(99))),
            Event::Cancel(Order::new(OrderId(1), Side::Buy, 4, p(99))),
            Event::Modify(Order::new(OrderId(9), Side::Buy, 4, p(99))),
        ];

        let mut incremental = OrderBook::new();
        let rejected = incremental.apply_all(&events);
        let replayed = OrderBook::replay(&events);

        assert_eq!(rejected, 1);
        assert_eq!(incremental.resting_orders(), replayed.resting_orders());
        assert_eq!(replayed.order(OrderId(1)).unwrap().quantity, 6);
    }
}
