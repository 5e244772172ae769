//! Selection strategies: every random choice the generator makes.
//!
//! The generator never touches an RNG directly. Swapping the strategy changes
//! what the simulated market does without changing how a move is turned into
//! consistent events.

use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{EventWeights, StrategyConfig};
use crate::error::{Error, Result};
use crate::{Level, OrderBook, OrderId, Price, Quantity, Side};

/// What a generator tick does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventChoice {
    Add,
    Modify,
    Cancel,
    PriceMove,
}

impl EventChoice {
    const ALL: [EventChoice; 4] = [
        EventChoice::Add,
        EventChoice::Modify,
        EventChoice::Cancel,
        EventChoice::PriceMove,
    ];
}

/// Whether the last order a price move reaches is filled in full or halved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchCase {
    Partial,
    Full,
}

/// Source of the generator's random decisions.
pub trait SelectionStrategy {
    fn choose_event(&mut self) -> EventChoice;

    fn choose_side(&mut self) -> Side;

    /// Pick a side, then one of its resting prices. `None` when the picked
    /// side is empty.
    fn choose_price(&mut self, book: &OrderBook) -> Option<(Side, Price)>;

    /// Pick one resting order at a level.
    fn choose_order(&mut self, level: &Level) -> Option<(OrderId, Quantity)>;

    /// A quantity in `1..=max`, different from `exclude` when one is given.
    fn choose_quantity(&mut self, exclude: Option<Quantity>) -> Quantity;

    /// How many levels a price move eats into.
    fn choose_tick_move(&mut self) -> usize;

    fn choose_match_case(&mut self) -> MatchCase;
}

/// Seeded weighted-random strategy.
///
/// Two instances built from the same seed make the same choices in the same
/// order.
#[derive(Clone, Debug)]
pub struct RandomStrategy {
    rng: ChaCha8Rng,
    events: WeightedIndex<u32>,
    tick_moves: WeightedIndex<u32>,
    max_order_quantity: Quantity,
}

impl RandomStrategy {
    pub fn new(config: &StrategyConfig, max_order_quantity: Quantity) -> Result<Self> {
        let events = event_index(&config.event_weights)?;
        let tick_moves = WeightedIndex::new(&config.tick_move_weights)
            .map_err(|e| Error::Config(format!("tick_move_weights: {e}")))?;

        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            events,
            tick_moves,
            max_order_quantity: max_order_quantity.max(1),
        })
    }
}

fn event_index(weights: &EventWeights) -> Result<WeightedIndex<u32>> {
    // Order matches EventChoice::ALL
    let w = [weights.add, weights.modify, weights.cancel, weights.price_move];
    WeightedIndex::new(w).map_err(|e| Error::Config(format!("event_weights: {e}")))
}

impl SelectionStrategy for RandomStrategy {
    fn choose_event(&mut self) -> EventChoice {
        EventChoice::ALL[self.events.sample(&mut self.rng)]
    }

    fn choose_side(&mut self) -> Side {
        if self.rng.gen_bool(0.5) {
            Side::Buy
        } else {
            Side::Sell
        }
    }

    fn choose_price(&mut self, book: &OrderBook) -> Option<(Side, Price)> {
        let side = self.choose_side();
        let levels = book.levels(side);
        if levels.is_empty() {
            return None;
        }
        let i = self.rng.gen_range(0..levels.level_count());
        levels.prices().nth(i).map(|price| (side, price))
    }

    fn choose_order(&mut self, level: &Level) -> Option<(OrderId, Quantity)> {
        if level.is_empty() {
            return None;
        }
        let i = self.rng.gen_range(0..level.order_count());
        level.iter().nth(i)
    }

    fn choose_quantity(&mut self, exclude: Option<Quantity>) -> Quantity {
        let max = self.max_order_quantity;
        match exclude {
            Some(q) if (1..=max).contains(&q) && max > 1 => {
                // Draw from 1..max and skip over the excluded value
                let pick = self.rng.gen_range(1..max);
                if pick >= q { pick + 1 } else { pick }
            }
            _ => self.rng.gen_range(1..=max),
        }
    }

    fn choose_tick_move(&mut self) -> usize {
        self.tick_moves.sample(&mut self.rng) + 1
    }

    fn choose_match_case(&mut self) -> MatchCase {
        if self.rng.gen_bool(0.5) {
            MatchCase::Partial
        } else {
            MatchCase::Full
        }
    }
}

/// Strategies selectable by name from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyKind {
    Random,
}

impl StrategyKind {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "random" => Ok(StrategyKind::Random),
            other => Err(Error::UnknownStrategy(other.to_string())),
        }
    }

    /// Build the strategy this kind names.
    pub fn build(
        self,
        config: &StrategyConfig,
        max_order_quantity: Quantity,
    ) -> Result<Box<dyn SelectionStrategy>> {
        match self {
            StrategyKind::Random => Ok(Box::new(RandomStrategy::new(config, max_order_quantity)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Order;

    fn strategy(seed: u64) -> RandomStrategy {
        let config = StrategyConfig {
            seed,
            ..StrategyConfig::default()
        };
        RandomStrategy::new(&config, 10).unwrap()
    }

    #[test]
    fn same_seed_same_choices() {
        let mut a = strategy(113);
        let mut b = strategy(113);

        for _ in 0..200 {
            assert_eq!(a.choose_event(), b.choose_event());
            assert_eq!(a.choose_quantity(Some(3)), b.choose_quantity(Some(3)));
            assert_eq!(a.choose_tick_move(), b.choose_tick_move());
            assert_eq!(a.choose_match_case(), b.choose_match_case());
        }
    }

    #[test]
    fn quantity_excludes_current() {
        let mut s = strategy(1);
        for _ in 0..1_000 {
            let q = s.choose_quantity(Some(4));
            assert!((1..=10).contains(&q));
            assert_ne!(q, 4);
        }
    }

    #[test]
    fn quantity_covers_whole_range() {
        let mut s = strategy(2);
        let mut seen = [false; 11];
        for _ in 0..2_000 {
            seen[s.choose_quantity(Some(10)) as usize] = true;
        }
        assert!(seen[1..10].iter().all(|&x| x));
        assert!(!seen[10]);
    }

    #[test]
    fn quantity_exclusion_outside_range_is_ignored() {
        let mut s = strategy(3);
        for _ in 0..200 {
            let q = s.choose_quantity(Some(50));
            assert!((1..=10).contains(&q));
        }
    }

    #[test]
    fn tick_move_in_range() {
        let mut s = strategy(4);
        for _ in 0..500 {
            assert!((1..=3).contains(&s.choose_tick_move()));
        }
    }

    #[test]
    fn zero_weight_event_never_chosen() {
        let config = StrategyConfig {
            event_weights: EventWeights {
                price_move: 0,
                ..EventWeights::default()
            },
            ..StrategyConfig::default()
        };
        let mut s = RandomStrategy::new(&config, 10).unwrap();
        for _ in 0..2_000 {
            assert_ne!(s.choose_event(), EventChoice::PriceMove);
        }
    }

    #[test]
    fn choose_price_picks_resting_price() {
        let mut book = OrderBook::new();
        book.add(Order::new(OrderId(1), Side::Buy, 1, Price::from(100)))
            .unwrap();
        book.add(Order::new(OrderId(2), Side::Buy, 1, Price::from(99)))
            .unwrap();

        let mut s = strategy(5);
        let mut picked_bid = false;
        for _ in 0..100 {
            match s.choose_price(&book) {
                Some((Side::Buy, price)) => {
                    assert!(book.level(Side::Buy, price).is_some());
                    picked_bid = true;
                }
                Some((Side::Sell, _)) => panic!("ask side is empty"),
                None => {}
            }
        }
        assert!(picked_bid);
    }

    #[test]
    fn choose_order_from_level() {
        let mut level = Level::new(Price::from(100));
        level.insert(OrderId(3), 7);
        level.insert(OrderId(8), 2);

        let mut s = strategy(6);
        for _ in 0..50 {
            let (id, qty) = s.choose_order(&level).unwrap();
            assert_eq!(level.get(id), Some(qty));
        }
        assert_eq!(s.choose_order(&Level::new(Price::from(1))), None);
    }

    #[test]
    fn registry() {
        assert_eq!(StrategyKind::from_name("random").unwrap(), StrategyKind::Random);
        assert!(matches!(
            StrategyKind::from_name("momentum"),
            Err(Error::UnknownStrategy(name)) if name == "momentum"
        ));
    }
}
