//! OrderBook: The complete order book with both sides and order storage.
//!
//! This is the core data structure that combines:
//! - Bids (buy orders) sorted high → low
//! - Asks (sell orders) sorted low → high
//! - A book-wide id index for duplicate detection and O(1) lookup by OrderId
//! - Per-price trade history
//! - The pending-match monitor and the anomaly counters
//!
//! The book applies feed events as given. It never matches orders itself: a
//! crossed touch is tracked by the monitor, not rejected.

use std::collections::BTreeMap;

use log::debug;
use rustc_hash::FxHashMap;

use crate::codec;
use crate::error::{Anomaly, BookStateError};
use crate::monitor::{ConsistencyMonitor, PendingMatch};
use crate::stats::Stats;
use crate::{Level, Order, OrderId, Price, PriceLevels, Quantity, Side, Trade};

/// The complete order book.
#[derive(Clone, Debug)]
pub struct OrderBook {
    /// Buy orders, sorted by price descending (best = highest)
    bids: PriceLevels,
    /// Sell orders, sorted by price ascending (best = lowest)
    asks: PriceLevels,
    /// Where each resting order lives
    index: FxHashMap<OrderId, (Side, Price)>,
    /// Fills per price, in arrival order
    trades: BTreeMap<Price, Vec<Trade>>,
    last_trade: Option<Trade>,
    monitor: ConsistencyMonitor,
    stats: Stats,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderBook {
    /// Create a new empty order book.
    pub fn new() -> Self {
        Self {
            bids: PriceLevels::new(Side::Buy),
            asks: PriceLevels::new(Side::Sell),
            index: FxHashMap::default(),
            trades: BTreeMap::new(),
            last_trade: None,
            monitor: ConsistencyMonitor::new(),
            stats: Stats::new(),
        }
    }

    // === Book access ===

    /// Get the bids side (buy orders).
    pub fn bids(&self) -> &PriceLevels {
        &self.bids
    }

    /// Get the asks side (sell orders).
    pub fn asks(&self) -> &PriceLevels {
        &self.asks
    }

    /// Get one side of the book.
    pub fn levels(&self, side: Side) -> &PriceLevels {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn levels_mut(&mut self, side: Side) -> &mut PriceLevels {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// The level at `(side, price)`, if anything rests there.
    pub fn level(&self, side: Side, price: Price) -> Option<&Level> {
        self.levels(side).get_level(price)
    }

    /// Look up a resting order by id.
    pub fn order(&self, order_id: OrderId) -> Option<Order> {
        let &(side, price) = self.index.get(&order_id)?;
        let quantity = self.level(side, price)?.get(order_id)?;
        Some(Order::new(order_id, side, quantity, price))
    }

    /// Check if an order is resting.
    pub fn contains_order(&self, order_id: OrderId) -> bool {
        self.index.contains_key(&order_id)
    }

    /// Number of resting orders on both sides.
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    /// Every resting order, bids then asks, each in ascending price then
    /// ascending id order.
    ///
    /// Two books built from the same events produce identical dumps.
    pub fn resting_orders(&self) -> Vec<Order> {
        let mut out = Vec::with_capacity(self.index.len());
        for side in [Side::Buy, Side::Sell] {
            let levels = self.levels(side);
            for price in levels.prices() {
                if let Some(level) = levels.get_level(price) {
                    out.extend(
                        level
                            .iter()
                            .map(|(id, qty)| Order::new(id, side, qty, price)),
                    );
                }
            }
        }
        out
    }

    // === Mutations ===

    /// Rest a new order at `(order.side, order.price)`.
    ///
    /// A second Add for an id that is already resting anywhere in the book is
    /// rejected and leaves the book untouched.
    pub fn add(&mut self, order: Order) -> Result<(), BookStateError> {
        if self.index.contains_key(&order.id) {
            return Err(self.reject(BookStateError::DuplicateOrderId));
        }

        self.levels_mut(order.side)
            .insert_order(order.price, order.id, order.quantity);
        self.index.insert(order.id, (order.side, order.price));

        let best_opposite = self.levels(order.side.opposite()).best_price();
        if let Some(anomaly) = self
            .monitor
            .on_add(order.side, order.price, order.id, best_opposite)
        {
            debug!("order {} added while a match is pending", order.id);
            self.stats.record_anomaly(&anomaly.into());
        }
        Ok(())
    }

    /// Replace the resting quantity of an order.
    pub fn modify(
        &mut self,
        order_id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Result<(), BookStateError> {
        let result = match self.levels_mut(side).get_level_mut(price) {
            None => Err(BookStateError::MissingPriceLevel),
            Some(level) => level
                .set_quantity(order_id, quantity)
                .map(|_| ())
                .ok_or(BookStateError::NoOrderForModify),
        };
        result.map_err(|e| self.reject(e))
    }

    /// Take `quantity` off a resting order, removing it (and its level, if
    /// emptied) when the cancel covers everything that rests.
    pub fn cancel(
        &mut self,
        order_id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Result<(), BookStateError> {
        if self.level(side, price).is_none() {
            return Err(self.reject(BookStateError::MissingPriceLevel));
        }
        let remaining = self
            .levels_mut(side)
            .reduce_order(price, order_id, quantity);
        match remaining {
            Some(0) => {
                self.index.remove(&order_id);
                Ok(())
            }
            Some(_) => Ok(()),
            None => Err(self.reject(BookStateError::NoOrderForModify)),
        }
    }

    /// Record a fill. Trades are not linked to resting orders.
    pub fn trade(&mut self, trade: Trade) {
        self.trades.entry(trade.price).or_default().push(trade);
        self.last_trade = Some(trade);
        self.monitor.on_trade(trade.price);
    }

    /// Decode one wire line and apply it, counting any anomaly.
    ///
    /// Never fails hard: malformed or inconsistent input is counted and
    /// returned so the caller can log it, and the book is left as it was.
    pub fn process_line(&mut self, line: &str) -> Result<(), Anomaly> {
        match codec::decode(line) {
            Ok(event) => self.apply(&event).map_err(Anomaly::from),
            Err(err) => {
                let anomaly = Anomaly::from(err);
                debug!("dropping line {line:?}: {anomaly}");
                self.stats.record_anomaly(&anomaly);
                Err(anomaly)
            }
        }
    }

    fn reject(&mut self, err: BookStateError) -> BookStateError {
        debug!("book rejected event: {err}");
        self.stats.record_anomaly(&err.into());
        err
    }

    // === Queries ===

    /// Best (highest) bid price.
    pub fn top_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    /// Best (lowest) ask price.
    pub fn top_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    /// Deepest (lowest) bid price.
    pub fn bottom_bid(&self) -> Option<Price> {
        self.bids.worst_price()
    }

    /// Deepest (highest) ask price.
    pub fn bottom_ask(&self) -> Option<Price> {
        self.asks.worst_price()
    }

    /// Touch price on one side.
    pub fn top(&self, side: Side) -> Option<Price> {
        self.levels(side).best_price()
    }

    /// Deepest price on one side.
    pub fn bottom(&self, side: Side) -> Option<Price> {
        self.levels(side).worst_price()
    }

    /// Returns the best bid and ask as a tuple.
    pub fn best_bid_ask(&self) -> (Option<Price>, Option<Price>) {
        (self.top_bid(), self.top_ask())
    }

    /// `(best bid + best ask) / 2`, or `None` when either side is empty.
    pub fn mid(&self) -> Option<f64> {
        let bid = self.top_bid()?;
        let ask = self.top_ask()?;
        Some((bid.to_f64() + ask.to_f64()) / 2.0)
    }

    /// True when the best bid is at or above the best ask.
    pub fn is_crossed(&self) -> bool {
        matches!(self.best_bid_ask(), (Some(bid), Some(ask)) if bid >= ask)
    }

    /// Fills reported at `price`, oldest first.
    pub fn trades_at(&self, price: Price) -> &[Trade] {
        self.trades.get(&price).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total quantity traded at `price`, saturating at `Quantity::MAX`.
    pub fn traded_quantity_at(&self, price: Price) -> Quantity {
        self.trades_at(price)
            .iter()
            .fold(0, |acc: Quantity, t| acc.saturating_add(t.quantity))
    }

    /// Most recent fill.
    pub fn last_trade(&self) -> Option<Trade> {
        self.last_trade
    }

    /// Number of fills recorded so far.
    pub fn trade_count(&self) -> usize {
        self.trades.values().map(Vec::len).sum()
    }

    /// The outstanding crossing Add, if any.
    pub fn pending_match(&self) -> Option<PendingMatch> {
        self.monitor.pending()
    }

    /// Anomaly counters accumulated so far.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }
}
