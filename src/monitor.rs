//! Pending-match tracking.
//!
//! A feed never reports matches directly: an aggressing Add rests on the book
//! for a moment, crossed, until the Trades that consume it arrive. The
//! monitor remembers the most recent crossing Add and flags any further Add
//! that shows up before a Trade has cleared it.
//!
//! The comparison is deliberately lopsided: a Buy at P crosses when the best
//! Sell is `<= P`, a Sell at P only when the best Buy is `> P`.

use crate::error::ConsistencyAnomaly;
use crate::{OrderId, Price, Side};

/// The single outstanding crossing Add.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingMatch {
    pub price: Price,
    pub order_id: OrderId,
}

/// Single-slot pending-match tracker.
///
/// Never touches book contents; the book feeds it the facts it needs.
#[derive(Clone, Debug, Default)]
pub struct ConsistencyMonitor {
    pending: Option<PendingMatch>,
}

impl ConsistencyMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The outstanding crossing Add, if any.
    #[inline]
    pub fn pending(&self) -> Option<PendingMatch> {
        self.pending
    }

    /// Observe an accepted Add.
    ///
    /// `best_opposite` is the best resting price on the other side of the book
    /// at the time of the Add. Returns an anomaly when the slot was already
    /// occupied, whatever the new order's price.
    pub fn on_add(
        &mut self,
        side: Side,
        price: Price,
        order_id: OrderId,
        best_opposite: Option<Price>,
    ) -> Option<ConsistencyAnomaly> {
        let anomaly = self
            .pending
            .is_some()
            .then_some(ConsistencyAnomaly::CrossedBookWhilePending);

        let crosses = match (side, best_opposite) {
            (Side::Buy, Some(best_sell)) => best_sell <= price,
            (Side::Sell, Some(best_buy)) => best_buy > price,
            (_, None) => false,
        };
        if crosses {
            self.pending = Some(PendingMatch { price, order_id });
        }

        anomaly
    }

    /// Observe a Trade. Clears the slot when the pending price is `>=` the
    /// trade price.
    ///
    /// A Trade that clears nothing is not an anomaly: trades are recorded
    /// whether or not an Add preceded them, so a bogus trade on the feed goes
    /// uncounted.
    pub fn on_trade(&mut self, price: Price) {
        if self.pending.is_some_and(|p| p.price >= price) {
            self.pending = None;
        }
    }
}
