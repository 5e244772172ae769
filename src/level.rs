//! Level: the resting orders at a single price point.
//!
//! A feed book has no time priority to honour, so orders are keyed by id and
//! iterated in ascending id order. That order is what the price-move
//! synthesizer walks when it decides which orders a sweep consumes.

use std::collections::BTreeMap;

use crate::{OrderId, Price, Quantity};

/// All resting orders at one price on one side.
///
/// The level tracks total quantity for depth queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    /// The price for all orders in this level
    price: Price,
    /// Resting quantity per order id
    orders: BTreeMap<OrderId, Quantity>,
    /// Sum of resting quantities (cached). Wider than `Quantity` so any mix
    /// of feed quantities sums exactly.
    total_quantity: u128,
}

impl Level {
    /// Create a new empty level at the given price.
    pub fn new(price: Price) -> Self {
        Self {
            price,
            orders: BTreeMap::new(),
            total_quantity: 0,
        }
    }

    /// Returns the price of this level.
    #[inline]
    pub fn price(&self) -> Price {
        self.price
    }

    /// Returns true if there are no orders at this level.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Returns the number of orders at this level.
    #[inline]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Returns the total quantity across all orders at this level,
    /// saturating at `Quantity::MAX`.
    #[inline]
    pub fn total_quantity(&self) -> Quantity {
        Quantity::try_from(self.total_quantity).unwrap_or(Quantity::MAX)
    }

    /// Resting quantity of one order, if present.
    #[inline]
    pub fn get(&self, order_id: OrderId) -> Option<Quantity> {
        self.orders.get(&order_id).copied()
    }

    /// Insert an order, or replace its quantity if the id is already here.
    pub fn insert(&mut self, order_id: OrderId, quantity: Quantity) {
        if let Some(old) = self.orders.insert(order_id, quantity) {
            self.total_quantity -= u128::from(old);
        }
        self.total_quantity += u128::from(quantity);
    }

    /// Replace the resting quantity of an existing order.
    ///
    /// Returns the previous quantity, or `None` if the order is not here.
    pub fn set_quantity(&mut self, order_id: OrderId, quantity: Quantity) -> Option<Quantity> {
        let slot = self.orders.get_mut(&order_id)?;
        let old = std::mem::replace(slot, quantity);
        self.total_quantity = self.total_quantity - u128::from(old) + u128::from(quantity);
        Some(old)
    }

    /// Reduce an order by `quantity`, removing it when nothing would remain.
    ///
    /// Returns the quantity still resting (0 if removed), or `None` if the
    /// order is not here.
    pub fn reduce(&mut self, order_id: OrderId, quantity: Quantity) -> Option<Quantity> {
        let resting = self.orders.get(&order_id).copied()?;
        if resting <= quantity {
            self.orders.remove(&order_id);
            self.total_quantity -= u128::from(resting);
            Some(0)
        } else {
            let remaining = resting - quantity;
            self.orders.insert(order_id, remaining);
            self.total_quantity -= u128::from(quantity);
            Some(remaining)
        }
    }

    /// Returns an iterator over `(id, quantity)` in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (OrderId, Quantity)> + '_ {
        self.orders.iter().map(|(&id, &qty)| (id, qty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_with(orders: &[(u64, Quantity)]) -> Level {
        let mut level = Level::new(Price::from(100));
        for &(id, qty) in orders {
            level.insert(OrderId(id), qty);
        }
        level
    }

    #[test]
    fn new_level_is_empty() {
        let level = Level::new(Price::from(100));

        assert!(level.is_empty());
        assert_eq!(level.order_count(), 0);
        assert_eq!(level.total_quantity(), 0);
        assert_eq!(level.price(), Price::from(100));
    }

    #[test]
    fn insert_tracks_total() {
        let level = level_with(&[(1, 100), (2, 200), (3, 150)]);

        assert_eq!(level.order_count(), 3);
        assert_eq!(level.total_quantity(), 450);
        assert_eq!(level.get(OrderId(2)), Some(200));
    }

    #[test]
    fn insert_existing_id_replaces() {
        let mut level = level_with(&[(1, 100)]);
        level.insert(OrderId(1), 40);

        assert_eq!(level.order_count(), 1);
        assert_eq!(level.total_quantity(), 40);
    }

    #[test]
    fn set_quantity_replaces_not_adds() {
        let mut level = level_with(&[(1, 100), (2, 200)]);

        assert_eq!(level.set_quantity(OrderId(1), 7), Some(100));
        assert_eq!(level.get(OrderId(1)), Some(7));
        assert_eq!(level.total_quantity(), 207);
        assert_eq!(level.set_quantity(OrderId(9), 7), None);
        assert_eq!(level.total_quantity(), 207);
    }

    #[test]
    fn reduce_partial_leaves_remainder() {
        let mut level = level_with(&[(1, 10)]);

        assert_eq!(level.reduce(OrderId(1), 3), Some(7));
        assert_eq!(level.get(OrderId(1)), Some(7));
        assert_eq!(level.total_quantity(), 7);
    }

    #[test]
    fn reduce_at_or_above_resting_removes() {
        let mut level = level_with(&[(1, 10), (2, 5)]);

        assert_eq!(level.reduce(OrderId(1), 10), Some(0));
        assert_eq!(level.get(OrderId(1)), None);
        assert_eq!(level.reduce(OrderId(2), 50), Some(0));
        assert!(level.is_empty());
        assert_eq!(level.total_quantity(), 0);
    }

    #[test]
    fn reduce_unknown_is_none() {
        let mut level = level_with(&[(1, 10)]);
        assert_eq!(level.reduce(OrderId(2), 1), None);
        assert_eq!(level.total_quantity(), 10);
    }

    #[test]
    fn total_saturates_instead_of_overflowing() {
        let max = Quantity::MAX / 2;
        let mut level = level_with(&[(1, max), (2, max), (3, max)]);
        assert_eq!(level.total_quantity(), Quantity::MAX);

        // Exact again once enough has been taken off
        level.reduce(OrderId(3), max);
        level.set_quantity(OrderId(2), 1);
        assert_eq!(level.total_quantity(), max + 1);
    }

    #[test]
    fn iter_is_id_ordered() {
        let level = level_with(&[(30, 1), (10, 2), (20, 3)]);
        let ids: Vec<_> = level.iter().map(|(id, _)| id.0).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }
}
