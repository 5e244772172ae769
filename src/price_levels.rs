//! PriceLevels: One side of the order book (bids or asks).
//!
//! A level exists only while it holds at least one order; the insert and
//! removal paths here are the only places levels are created or destroyed.

use std::collections::BTreeMap;

use crate::{Level, OrderId, Price, Quantity, Side};

/// One side of the order book (all bids or all asks).
///
/// - **Bids**: best = highest price, worst = lowest
/// - **Asks**: best = lowest price, worst = highest
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceLevels {
    /// Price levels, sorted by price
    levels: BTreeMap<Price, Level>,
    /// Which side this represents (determines "best" direction)
    side: Side,
}

impl PriceLevels {
    /// Create a new empty price levels collection for the given side.
    pub fn new(side: Side) -> Self {
        Self {
            levels: BTreeMap::new(),
            side,
        }
    }

    /// Returns which side this collection represents.
    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Returns true if there are no orders on this side.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Returns the number of distinct price levels.
    #[inline]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Returns the best price (highest for bids, lowest for asks).
    pub fn best_price(&self) -> Option<Price> {
        match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    /// Returns the worst price (lowest for bids, highest for asks).
    pub fn worst_price(&self) -> Option<Price> {
        match self.side {
            Side::Buy => self.levels.keys().next().copied(),
            Side::Sell => self.levels.keys().next_back().copied(),
        }
    }

    /// Returns a reference to the level at the given price, if it exists.
    pub fn get_level(&self, price: Price) -> Option<&Level> {
        self.levels.get(&price)
    }

    /// Returns a mutable reference to the level at the given price, if it exists.
    ///
    /// Callers that may empty the level must go through [`reduce_order`]
    /// instead so the level is dropped.
    ///
    /// [`reduce_order`]: PriceLevels::reduce_order
    pub fn get_level_mut(&mut self, price: Price) -> Option<&mut Level> {
        self.levels.get_mut(&price)
    }

    /// Add an order at the given price, creating the level if needed.
    pub fn insert_order(&mut self, price: Price, order_id: OrderId, quantity: Quantity) {
        self.levels
            .entry(price)
            .or_insert_with(|| Level::new(price))
            .insert(order_id, quantity);
    }

    /// Reduce an order at `price`, dropping the level if it empties.
    ///
    /// Returns the quantity still resting, or `None` if the order is not at
    /// that level (or the level does not exist).
    pub fn reduce_order(
        &mut self,
        price: Price,
        order_id: OrderId,
        quantity: Quantity,
    ) -> Option<Quantity> {
        let level = self.levels.get_mut(&price)?;
        let remaining = level.reduce(order_id, quantity)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Some(remaining)
    }

    /// Returns an iterator over levels from best to worst price.
    ///
    /// - Bids: highest to lowest
    /// - Asks: lowest to highest
    pub fn iter_best_to_worst(&self) -> impl Iterator<Item = (&Price, &Level)> {
        BestToWorstIter {
            inner: if self.side == Side::Buy {
                IterDirection::Reverse(self.levels.iter().rev())
            } else {
                IterDirection::Forward(self.levels.iter())
            },
        }
    }

    /// Returns all resting prices in ascending order.
    pub fn prices(&self) -> impl Iterator<Item = Price> + '_ {
        self.levels.keys().copied()
    }

    /// Returns the total quantity across all levels, saturating at
    /// `Quantity::MAX`.
    pub fn total_quantity(&self) -> Quantity {
        self.levels
            .values()
            .fold(0, |acc: Quantity, l| acc.saturating_add(l.total_quantity()))
    }

    /// Returns the total number of resting orders across all levels.
    pub fn order_count(&self) -> usize {
        self.levels.values().map(|l| l.order_count()).sum()
    }
}

/// Direction wrapper for the iterator.
enum IterDirection<F, R> {
    Forward(F),
    Reverse(R),
}

type BTreeIter<'a> = std::collections::btree_map::Iter<'a, Price, Level>;

/// Iterator that yields levels from best to worst price.
struct BestToWorstIter<'a> {
    inner: IterDirection<BTreeIter<'a>, std::iter::Rev<BTreeIter<'a>>>,
}

impl<'a> Iterator for BestToWorstIter<'a> {
    type Item = (&'a Price, &'a Level);

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            IterDirection::Forward(iter) => iter.next(),
            IterDirection::Reverse(iter) => iter.next(),
        }
    }
}
