//! Malformed-event injection on the generation side.
//!
//! The generator offers every add, cancel and price-move aggressor to an
//! injector, which may answer with extra lines that a consumer must reject or
//! flag. Injected lines are never applied to the generator's own book.

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::ErrorConfig;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::{Order, OrderIdGen, Price, Quantity, Side, Trade};

/// Kind of malformed or inconsistent line an injector can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum InjectedErrorKind {
    DuplicateId,
    IdRange,
    IdSyntax,
    SideValue,
    SideMissing,
    QuantityRange,
    QuantitySyntax,
    PriceRange,
    PriceSyntax,
    MissingEventKind,
    BadCancel,
    BogusAdd,
    BogusTrade,
}

impl InjectedErrorKind {
    pub const COUNT: usize = 13;

    pub const ALL: [InjectedErrorKind; Self::COUNT] = [
        InjectedErrorKind::DuplicateId,
        InjectedErrorKind::IdRange,
        InjectedErrorKind::IdSyntax,
        InjectedErrorKind::SideValue,
        InjectedErrorKind::SideMissing,
        InjectedErrorKind::QuantityRange,
        InjectedErrorKind::QuantitySyntax,
        InjectedErrorKind::PriceRange,
        InjectedErrorKind::PriceSyntax,
        InjectedErrorKind::MissingEventKind,
        InjectedErrorKind::BadCancel,
        InjectedErrorKind::BogusAdd,
        InjectedErrorKind::BogusTrade,
    ];

    /// Add-time corruptions, in the order they are rolled.
    const ON_ADD: [InjectedErrorKind; 10] = [
        InjectedErrorKind::DuplicateId,
        InjectedErrorKind::IdRange,
        InjectedErrorKind::IdSyntax,
        InjectedErrorKind::SideValue,
        InjectedErrorKind::SideMissing,
        InjectedErrorKind::QuantityRange,
        InjectedErrorKind::QuantitySyntax,
        InjectedErrorKind::PriceRange,
        InjectedErrorKind::PriceSyntax,
        InjectedErrorKind::MissingEventKind,
    ];

    pub fn label(self) -> &'static str {
        match self {
            InjectedErrorKind::DuplicateId => "Duplicate order id",
            InjectedErrorKind::IdRange => "Order range",
            InjectedErrorKind::IdSyntax => "Order syntax",
            InjectedErrorKind::SideValue => "Side value",
            InjectedErrorKind::SideMissing => "Side missing",
            InjectedErrorKind::QuantityRange => "Quantity range",
            InjectedErrorKind::QuantitySyntax => "Quantity syntax",
            InjectedErrorKind::PriceRange => "Price range",
            InjectedErrorKind::PriceSyntax => "Price syntax",
            InjectedErrorKind::MissingEventKind => "Corrupt line",
            InjectedErrorKind::BadCancel => "No order id with cancel",
            InjectedErrorKind::BogusAdd => "Crossing add without trade",
            InjectedErrorKind::BogusTrade => "Trade without order",
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// One injected line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InjectedEvent {
    pub kind: InjectedErrorKind,
    /// Wire line, without a terminator
    pub line: String,
}

impl InjectedEvent {
    fn new(kind: InjectedErrorKind, line: String) -> Self {
        Self { kind, line }
    }
}

impl fmt::Display for InjectedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

/// How many lines of each kind were injected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InjectorStats {
    counts: [u64; InjectedErrorKind::COUNT],
}

impl InjectorStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record(&mut self, kind: InjectedErrorKind) {
        self.counts[kind.index()] += 1;
    }

    #[inline]
    pub fn get(&self, kind: InjectedErrorKind) -> u64 {
        self.counts[kind.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InjectedErrorKind, u64)> + '_ {
        InjectedErrorKind::ALL.iter().map(|&k| (k, self.get(k)))
    }
}

impl Serialize for InjectorStats {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(InjectedErrorKind::COUNT))?;
        for (kind, count) in self.iter() {
            map.serialize_entry(&kind, &count)?;
        }
        map.end()
    }
}

impl fmt::Display for InjectorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Injected errors")?;
        for (kind, count) in self.iter() {
            writeln!(f, "{}:{:3}", kind.label(), count)?;
        }
        Ok(())
    }
}

/// Decides when and how to corrupt the generated stream.
pub trait ErrorInjector {
    /// Called after an Add has been emitted and applied.
    fn offer_add(&mut self, order: &Order) -> Vec<InjectedEvent>;

    /// Called after a Cancel has been emitted and applied.
    fn offer_cancel(&mut self, side: Side, quantity: Quantity, price: Price)
    -> Option<InjectedEvent>;

    /// Called after a price-move aggressor has been added. Ids for extra
    /// orders come from `ids`.
    fn offer_aggressor(
        &mut self,
        aggressor: &Order,
        ids: &mut OrderIdGen,
        tick: Price,
    ) -> Vec<InjectedEvent>;

    fn stats(&self) -> &InjectorStats;
}

/// Injector that never fires.
#[derive(Clone, Debug, Default)]
pub struct NoInjection {
    stats: InjectorStats,
}

impl ErrorInjector for NoInjection {
    fn offer_add(&mut self, _order: &Order) -> Vec<InjectedEvent> {
        Vec::new()
    }

    fn offer_cancel(
        &mut self,
        _side: Side,
        _quantity: Quantity,
        _price: Price,
    ) -> Option<InjectedEvent> {
        None
    }

    fn offer_aggressor(
        &mut self,
        _aggressor: &Order,
        _ids: &mut OrderIdGen,
        _tick: Price,
    ) -> Vec<InjectedEvent> {
        Vec::new()
    }

    fn stats(&self) -> &InjectorStats {
        &self.stats
    }
}

/// Order id that is never handed out by the generator, used for bad cancels.
const UNKNOWN_ORDER_ID: u64 = 1;

/// Seeded injector: each kind fires independently with probability
/// `1 / one_in` per opportunity.
#[derive(Clone, Debug)]
pub struct RandomInjector {
    rng: ChaCha8Rng,
    config: ErrorConfig,
    stats: InjectorStats,
}

impl RandomInjector {
    pub fn new(config: &ErrorConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config: config.clone(),
            stats: InjectorStats::new(),
        }
    }

    fn one_in(&self, kind: InjectedErrorKind) -> u32 {
        let c = &self.config;
        match kind {
            InjectedErrorKind::DuplicateId => c.duplicate_id_one_in,
            InjectedErrorKind::BadCancel => c.bad_cancel_one_in,
            InjectedErrorKind::BogusAdd => c.bogus_add_one_in,
            InjectedErrorKind::BogusTrade => c.bogus_trade_one_in,
            _ => c.field_error_one_in,
        }
    }

    fn fires(&mut self, kind: InjectedErrorKind) -> bool {
        let denominator = self.one_in(kind).max(1);
        self.rng.gen_ratio(1, denominator)
    }

    fn emit(&mut self, kind: InjectedErrorKind, line: String) -> InjectedEvent {
        self.stats.record(kind);
        InjectedEvent::new(kind, line)
    }
}

/// The corrupted Add line for one add-time kind.
fn corrupt_add(kind: InjectedErrorKind, o: &Order) -> String {
    let (id, side, qty, px) = (o.id, o.side, o.quantity, o.price);
    match kind {
        InjectedErrorKind::DuplicateId => Event::Add(*o).to_string(),
        InjectedErrorKind::IdRange => format!("A,-{id},{side},{qty},{px}"),
        InjectedErrorKind::IdSyntax => format!("A,ABDC,{side},{qty},{px}"),
        InjectedErrorKind::SideValue => format!("A,{id},C,{qty},{px}"),
        InjectedErrorKind::SideMissing => format!("A,{id},,{qty},{px}"),
        InjectedErrorKind::QuantityRange => format!("A,{id},{side},-{qty},{px}"),
        InjectedErrorKind::QuantitySyntax => format!("A,{id},{side},ABDC,{px}"),
        InjectedErrorKind::PriceRange => format!("A,{id},{side},{qty},-{px}"),
        InjectedErrorKind::PriceSyntax => format!("A,{id},{side},{qty},ABDC"),
        // Payload with the leading kind byte dropped
        _ => format!(",{o}"),
    }
}

impl ErrorInjector for RandomInjector {
    fn offer_add(&mut self, order: &Order) -> Vec<InjectedEvent> {
        let mut out = Vec::new();
        for kind in InjectedErrorKind::ON_ADD {
            if self.fires(kind) {
                let line = corrupt_add(kind, order);
                out.push(self.emit(kind, line));
            }
        }
        out
    }

    fn offer_cancel(
        &mut self,
        side: Side,
        quantity: Quantity,
        price: Price,
    ) -> Option<InjectedEvent> {
        if !self.fires(InjectedErrorKind::BadCancel) {
            return None;
        }
        let line = format!("X,{UNKNOWN_ORDER_ID},{side},{quantity},{price}");
        Some(self.emit(InjectedErrorKind::BadCancel, line))
    }

    fn offer_aggressor(
        &mut self,
        aggressor: &Order,
        ids: &mut OrderIdGen,
        tick: Price,
    ) -> Vec<InjectedEvent> {
        let mut out = Vec::new();
        if self.fires(InjectedErrorKind::BogusAdd) {
            let bogus = Order::new(ids.next_id(), aggressor.side.opposite(), 1, aggressor.price);
            out.push(self.emit(InjectedErrorKind::BogusAdd, Event::Add(bogus).to_string()));
        }
        if self.fires(InjectedErrorKind::BogusTrade) {
            let trade = Trade::new(aggressor.side.opposite(), 1, aggressor.price - tick);
            out.push(self.emit(InjectedErrorKind::BogusTrade, Event::Trade(trade).to_string()));
        }
        out
    }

    fn stats(&self) -> &InjectorStats {
        &self.stats
    }
}

/// Injectors selectable by name from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InjectorKind {
    Random,
    None,
}

impl InjectorKind {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "random" => Ok(InjectorKind::Random),
            "none" => Ok(InjectorKind::None),
            other => Err(Error::UnknownInjector(other.to_string())),
        }
    }

    pub fn build(self, config: &ErrorConfig) -> Box<dyn ErrorInjector> {
        match self {
            InjectorKind::Random => Box::new(RandomInjector::new(config)),
            InjectorKind::None => Box::new(NoInjection::default()),
        }
    }
}
