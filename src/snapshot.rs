//! Book snapshots for rendering.
//!
//! A snapshot is an owned copy of the top of both sides, so it can be moved to
//! the rendering thread while ingestion keeps mutating the book.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{OrderBook, Price, PriceLevels, Quantity};

/// Levels shown when no depth is configured.
pub const DEFAULT_DEPTH: usize = 5;

const RULE: &str = "|-----------------------------------------|";

/// A snapshot of the order book at a point in the stream.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// Lines processed when the snapshot was taken
    pub sequence: u64,
    /// Bid levels (highest price first)
    pub bids: Vec<LevelSnapshot>,
    /// Ask levels (lowest price first)
    pub asks: Vec<LevelSnapshot>,
}

impl BookSnapshot {
    /// Tag the snapshot with a stream position.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Returns the best bid price, if any.
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|l| l.price)
    }

    /// Returns the best ask price, if any.
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|l| l.price)
    }

    /// Returns the spread (best ask - best bid), if both exist.
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Returns the mid price ((best bid + best ask) / 2), if both exist.
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.to_f64() + ask.to_f64()) / 2.0),
            _ => None,
        }
    }

    /// Returns total bid quantity across the captured levels.
    pub fn total_bid_quantity(&self) -> Quantity {
        self.bids
            .iter()
            .fold(0, |acc: Quantity, l| acc.saturating_add(l.quantity))
    }

    /// Returns total ask quantity across the captured levels.
    pub fn total_ask_quantity(&self) -> Quantity {
        self.asks
            .iter()
            .fold(0, |acc: Quantity, l| acc.saturating_add(l.quantity))
    }
}

/// A snapshot of a single price level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    /// Price at this level
    pub price: Price,
    /// Total quantity at this level
    pub quantity: Quantity,
    /// Number of orders at this level
    pub order_count: usize,
}

impl fmt::Display for BookSnapshot {
    /// Fixed-width table, bids and asks side by side, best level first.
    /// Prices are rounded to whole units for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Mid price {:5.2}", self.mid_price().unwrap_or(0.0))?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "|         Bid        |         Ask        |")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "|Level| Num | Qty |Price|Price| Qty | Num |")?;
        writeln!(f, "{RULE}")?;

        let rows = self.bids.len().max(self.asks.len());
        for i in 0..rows {
            let (b_num, b_qty, b_px) = columns(self.bids.get(i));
            let (a_num, a_qty, a_px) = columns(self.asks.get(i));
            writeln!(
                f,
                "|{i:5}|{b_num:5}|{b_qty:5}|{b_px:5.0}|{a_px:5.0}|{a_qty:5}|{a_num:5}|"
            )?;
        }
        writeln!(f, "{RULE}")
    }
}

fn columns(level: Option<&LevelSnapshot>) -> (usize, Quantity, f64) {
    level.map_or((0, 0, 0.0), |l| {
        (l.order_count, l.quantity, l.price.to_f64().round())
    })
}

impl OrderBook {
    /// Take a snapshot of the top N levels on each side.
    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        fn snapshot_levels(levels: &PriceLevels, depth: usize) -> Vec<LevelSnapshot> {
            levels
                .iter_best_to_worst()
                .take(depth)
                .map(|(price, level)| LevelSnapshot {
                    price: *price,
                    quantity: level.total_quantity(),
                    order_count: level.order_count(),
                })
                .collect()
        }

        BookSnapshot {
            sequence: 0,
            bids: snapshot_levels(self.bids(), depth),
            asks: snapshot_levels(self.asks(), depth),
        }
    }

    /// Take a full snapshot of all levels.
    pub fn full_snapshot(&self) -> BookSnapshot {
        self.snapshot(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Order, OrderId, Side};

    fn p(v: i64) -> Price {
        Price::from(v)
    }

    fn book_with(orders: &[(u64, Side, Quantity, i64)]) -> OrderBook {
        let mut book = OrderBook::new();
        for &(id, side, qty, price) in orders {
            book.add(Order::new(OrderId(id), side, qty, p(price))).unwrap();
        }
        book
    }

    #[test]
    fn empty_snapshot() {
        let book = OrderBook::new();
        let snap = book.snapshot(10);

        assert!(snap.bids.is_empty());
        assert!(snap.asks.is_empty());
        assert_eq!(snap.best_bid(), None);
        assert_eq!(snap.best_ask(), None);
        assert_eq!(snap.spread(), None);
        assert_eq!(snap.mid_price(), None);
    }

    #[test]
    fn snapshot_with_orders() {
        let book = book_with(&[
            (1, Side::Buy, 100, 100),
            (2, Side::Buy, 50, 100),
            (3, Side::Buy, 200, 99),
            (4, Side::Sell, 75, 101),
            (5, Side::Sell, 150, 102),
        ]);

        let snap = book.snapshot(10);

        // Check bids (best first = highest)
        assert_eq!(snap.bids.len(), 2);
        assert_eq!(snap.bids[0].price, p(100));
        assert_eq!(snap.bids[0].quantity, 150);
        assert_eq!(snap.bids[0].order_count, 2);
        assert_eq!(snap.bids[1].price, p(99));

        // Check asks (best first = lowest)
        assert_eq!(snap.asks[0].price, p(101));
        assert_eq!(snap.asks[1].price, p(102));

        assert_eq!(snap.spread(), Some(p(1)));
        assert_eq!(snap.mid_price(), Some(100.5));
        assert_eq!(snap.total_bid_quantity(), 350);
        assert_eq!(snap.total_ask_quantity(), 225);
    }

    #[test]
    fn snapshot_depth_limit() {
        let orders: Vec<_> = (0..5)
            .map(|i| (i as u64 + 1, Side::Buy, 100, 100 - i))
            .collect();
        let book = book_with(&orders);

        let snap = book.snapshot(3);
        assert_eq!(snap.bids.len(), 3);
        assert_eq!(snap.bids[2].price, p(98));
        assert_eq!(book.full_snapshot().bids.len(), 5);
    }

    #[test]
    fn text_table_layout() {
        let book = book_with(&[
            (1, Side::Buy, 10, 1000),
            (2, Side::Buy, 5, 1000),
            (3, Side::Buy, 7, 990),
            (4, Side::Sell, 3, 1050),
        ]);

        let text = book.snapshot(DEFAULT_DEPTH).to_string();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[1], "Mid price 1025.00");
        assert_eq!(lines[5], "|Level| Num | Qty |Price|Price| Qty | Num |");
        assert_eq!(lines[7], "|    0|    2|   15| 1000| 1050|    3|    1|");
        assert_eq!(lines[8], "|    1|    1|    7|  990|    0|    0|    0|");
        assert_eq!(lines[9], RULE);
    }

    #[test]
    fn text_of_empty_book_has_zero_mid() {
        let text = OrderBook::new().snapshot(5).to_string();
        assert!(text.contains("Mid price  0.00"));
    }

    #[test]
    fn json_round_trip() {
        let book = book_with(&[(1, Side::Buy, 10, 1000), (2, Side::Sell, 3, 1050)]);
        let snap = book.snapshot(5).with_sequence(42);

        let json = serde_json::to_string(&snap).unwrap();
        let back: BookSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
        assert_eq!(back.sequence, 42);
    }
}
