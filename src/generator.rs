//! Market-data generator.
//!
//! The generator keeps its own [`OrderBook`] and routes every event it emits
//! through it, so the stream it produces is always consistent with a book a
//! consumer can rebuild. A price move is the one multi-event transaction: an
//! aggressing order sweeps one to a few levels, the fills and removals are
//! reported, and the book is then settled back to `num_levels` per side.

use std::fmt;

use log::{debug, info, warn};

use crate::config::{Config, GeneratorConfig};
use crate::error::Result;
use crate::event::Event;
use crate::injector::{ErrorInjector, InjectedEvent, InjectorKind, InjectorStats};
use crate::strategy::{EventChoice, MatchCase, SelectionStrategy, StrategyKind};
use crate::{Order, OrderBook, OrderId, OrderIdGen, Price, Quantity, Side, Trade};

/// One line produced by the generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Emission {
    /// A consistent event, already applied to the generator's book
    Event(Event),
    /// A deliberately malformed or inconsistent line, never applied
    Injected(InjectedEvent),
}

impl Emission {
    pub fn is_injected(&self) -> bool {
        matches!(self, Emission::Injected(_))
    }

    /// The event, when this is not an injected line.
    pub fn event(&self) -> Option<&Event> {
        match self {
            Emission::Event(e) => Some(e),
            Emission::Injected(_) => None,
        }
    }
}

impl fmt::Display for Emission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Emission::Event(e) => e.fmt(f),
            Emission::Injected(i) => i.fmt(f),
        }
    }
}

/// What a price move takes off the book.
#[derive(Debug, Default)]
struct Sweep {
    trades: Vec<Trade>,
    cancels: Vec<Order>,
    modify: Option<Order>,
    matched: Quantity,
    price: Option<Price>,
}

/// Event synthesizer driven by a selection strategy.
pub struct Generator {
    config: GeneratorConfig,
    book: OrderBook,
    ids: OrderIdGen,
    strategy: Box<dyn SelectionStrategy>,
    injector: Box<dyn ErrorInjector>,
    emitted: Vec<Emission>,
}

impl Generator {
    pub fn new(
        config: GeneratorConfig,
        strategy: Box<dyn SelectionStrategy>,
        injector: Box<dyn ErrorInjector>,
    ) -> Self {
        Self {
            ids: OrderIdGen::new(config.start_order_id),
            config,
            book: OrderBook::new(),
            strategy,
            injector,
            emitted: Vec::new(),
        }
    }

    /// Build a generator from configuration, resolving strategy and injector
    /// names. Injection is off unless `errors.enabled` is set.
    pub fn from_config(config: &Config) -> Result<Self> {
        let strategy = StrategyKind::from_name(&config.strategy.name)?
            .build(&config.strategy, config.generator.max_order_quantity)?;
        // A misspelled injector is an error even while injection is off
        InjectorKind::from_name(&config.errors.injector)?;
        let injector_kind = InjectorKind::from_name(config.errors.effective_injector())?;
        info!(
            "generator: strategy={} seed={} injector={:?}",
            config.strategy.name, config.strategy.seed, injector_kind
        );
        Ok(Self::new(
            config.generator.clone(),
            strategy,
            injector_kind.build(&config.errors),
        ))
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn injector_stats(&self) -> &InjectorStats {
        self.injector.stats()
    }

    /// Emissions not yet drained.
    pub fn emitted(&self) -> &[Emission] {
        &self.emitted
    }

    /// Take everything emitted so far.
    pub fn drain_emitted(&mut self) -> Vec<Emission> {
        std::mem::take(&mut self.emitted)
    }

    /// Seed the book: `num_levels` bids from the start price upward, a one
    /// level gap, then `num_levels` asks.
    pub fn create_order_book(&mut self) {
        let g = &self.config;
        let (tick, start, n) = (g.tick_size, g.start_price, g.num_levels as i64);
        let quantity = g.max_order_quantity / 2;

        for i in 0..n {
            let order = Order::new(self.ids.next_id(), Side::Buy, quantity, start.offset(tick, i));
            self.emit(Event::Add(order));
        }
        for i in (n + 1)..=(2 * n) {
            let order = Order::new(self.ids.next_id(), Side::Sell, quantity, start.offset(tick, i));
            self.emit(Event::Add(order));
        }
    }

    /// Run `changes` ticks.
    pub fn generate(&mut self, changes: usize) {
        for _ in 0..changes {
            self.tick();
        }
    }

    /// One strategy-driven step. Emits nothing when the chosen action is not
    /// possible at the chosen level.
    pub fn tick(&mut self) {
        let choice = self.strategy.choose_event();
        let Some((side, price)) = self.strategy.choose_price(&self.book) else {
            debug!("tick skipped: chosen side is empty");
            return;
        };

        match choice {
            EventChoice::Add => self.gen_add(side, price),
            EventChoice::Modify => self.gen_modify(side, price),
            EventChoice::Cancel => self.gen_cancel(side, price),
            EventChoice::PriceMove => self.gen_price_move(side),
        }
    }

    // === Single events ===

    fn gen_add(&mut self, side: Side, price: Price) {
        let resting = self
            .book
            .level(side, price)
            .map_or(0, |level| level.order_count());
        if resting >= self.config.max_orders_per_level {
            return;
        }

        let quantity = self.strategy.choose_quantity(None);
        let order = Order::new(self.ids.next_id(), side, quantity, price);
        self.emit(Event::Add(order));

        let injected = self.injector.offer_add(&order);
        self.inject(injected);
    }

    fn gen_modify(&mut self, side: Side, price: Price) {
        let Some(level) = self.book.level(side, price) else {
            return;
        };
        let Some((id, quantity)) = self.strategy.choose_order(level) else {
            return;
        };

        let new_quantity = self.strategy.choose_quantity(Some(quantity));
        self.emit(Event::Modify(Order::new(id, side, new_quantity, price)));
    }

    fn gen_cancel(&mut self, side: Side, price: Price) {
        let Some(level) = self.book.level(side, price) else {
            return;
        };
        let Some((id, quantity)) = self.strategy.choose_order(level) else {
            return;
        };
        // Never empty a level outside of a price move
        if level.order_count() < 2 {
            return;
        }

        self.emit(Event::Cancel(Order::new(id, side, quantity, price)));
        if let Some(bad) = self.injector.offer_cancel(side, quantity, price) {
            self.inject(vec![bad]);
        }
    }

    // === Price move ===

    /// Moves are refused once the mid has drifted `tick_margin` ticks from the
    /// start price in the direction the move would push it.
    fn allow_price_move(&self, side: Side) -> bool {
        let (Some(bid), Some(ask)) = self.book.best_bid_ask() else {
            return false;
        };
        let mid = Price::new((bid.0 + ask.0) / rust_decimal::Decimal::TWO);
        let g = &self.config;
        let margin = i64::from(g.tick_margin);
        match side {
            Side::Buy => mid >= g.start_price.offset(g.tick_size, -margin),
            Side::Sell => mid <= g.start_price.offset(g.tick_size, margin),
        }
    }

    /// Sweep `side` from the touch, report it, then settle the book.
    fn gen_price_move(&mut self, side: Side) {
        if !self.allow_price_move(side) {
            debug!("price move on {side} refused: mid at limit");
            return;
        }

        let ticks = self.strategy.choose_tick_move();
        let case = self.strategy.choose_match_case();
        let sweep = self.sweep(side, ticks, case);
        let Some(match_price) = sweep.price else {
            return;
        };

        let aggressor = Order::new(self.ids.next_id(), side.opposite(), sweep.matched, match_price);
        self.emit(Event::Add(aggressor));

        let injected = self
            .injector
            .offer_aggressor(&aggressor, &mut self.ids, self.config.tick_size);
        self.inject(injected);

        for trade in sweep.trades {
            self.emit(Event::Trade(trade));
        }
        self.emit(Event::Cancel(aggressor));
        for cancel in sweep.cancels {
            self.emit(Event::Cancel(cancel));
        }
        if let Some(modify) = sweep.modify {
            self.emit(Event::Modify(modify));
        }

        debug!("price move: {side} swept {ticks} tick(s) to {match_price}");
        self.stabilize(side);
    }

    /// Walk the `ticks` best levels of `side`, orders in id order.
    ///
    /// Everything is filled in full, except that a multi-tick partial move
    /// only takes half (rounded down) of the last order it reaches, provided
    /// that order has more than one lot.
    fn sweep(&self, side: Side, ticks: usize, case: MatchCase) -> Sweep {
        let levels: Vec<_> = self.book.levels(side).iter_best_to_worst().take(ticks).collect();
        let mut sweep = Sweep::default();
        let last_level = levels.len().saturating_sub(1);

        for (i, (&price, level)) in levels.into_iter().enumerate() {
            let last_order = level.order_count().saturating_sub(1);
            for (j, (id, quantity)) in level.iter().enumerate() {
                let partial = case == MatchCase::Partial
                    && ticks > 1
                    && i == last_level
                    && j == last_order
                    && quantity > 1;
                if partial {
                    let filled = quantity / 2;
                    sweep.matched = sweep.matched.saturating_add(filled);
                    sweep.trades.push(Trade::new(side, filled, price));
                    sweep.modify = Some(Order::new(id, side, quantity - filled, price));
                } else {
                    sweep.matched = sweep.matched.saturating_add(quantity);
                    sweep.trades.push(Trade::new(side, quantity, price));
                    sweep.cancels.push(Order::new(id, side, quantity, price));
                }
            }
            sweep.price = Some(price);
        }
        sweep
    }

    /// Close the gap a move opened, refill the side that moved back to
    /// `num_levels`, then cancel everything deeper than `num_levels`.
    fn stabilize(&mut self, side: Side) {
        let (Some(top_bid), Some(top_ask)) = self.book.best_bid_ask() else {
            warn!("cannot stabilize after {side} move: one side of the book is empty");
            return;
        };
        let (Some(top), Some(bottom)) = (self.book.top(side), self.book.bottom(side)) else {
            return;
        };

        let g = &self.config;
        let tick = g.tick_size;
        let add_ticks = (top_bid.ticks_to(top_ask, tick) - 1).clamp(0, i64::from(g.tick_margin));
        let backfill = g.num_levels.saturating_sub(self.book.levels(side).level_count()) as i64;
        let direction = match side {
            Side::Buy => 1,
            Side::Sell => -1,
        };

        for i in 1..=add_ticks {
            let quantity = self.strategy.choose_quantity(None);
            let order = Order::new(
                self.ids.next_id(),
                side.opposite(),
                quantity,
                top.offset(tick, direction * i),
            );
            self.emit(Event::Add(order));
        }
        for i in 1..=backfill {
            let price = bottom.offset(tick, -direction * i);
            if !price.is_positive() {
                warn!("backfill on {side} stopped at non-positive price {price}");
                break;
            }
            let quantity = self.strategy.choose_quantity(None);
            let order = Order::new(self.ids.next_id(), side, quantity, price);
            self.emit(Event::Add(order));
        }

        self.trim(Side::Buy);
        self.trim(Side::Sell);
    }

    /// Cancel every order beyond the `num_levels` best levels of `side`.
    fn trim(&mut self, side: Side) {
        let surplus: Vec<(Price, Vec<(OrderId, Quantity)>)> = self
            .book
            .levels(side)
            .iter_best_to_worst()
            .skip(self.config.num_levels)
            .map(|(&price, level)| (price, level.iter().collect()))
            .collect();

        for (price, orders) in surplus {
            for (id, quantity) in orders {
                self.emit(Event::Cancel(Order::new(id, side, quantity, price)));
            }
        }
    }

    // === Output ===

    fn emit(&mut self, event: Event) {
        if let Err(err) = self.book.apply(&event) {
            warn!("generated event {event} rejected by own book: {err}");
        }
        self.emitted.push(Emission::Event(event));
    }

    fn inject(&mut self, injected: Vec<InjectedEvent>) {
        self.emitted
            .extend(injected.into_iter().map(Emission::Injected));
    }
}
