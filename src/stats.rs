//! Anomaly counters for the ingestion side.
//!
//! One [`Stats`] value is owned by each [`OrderBook`](crate::OrderBook).
//! Counters only ever go up.

use std::fmt;

use serde::Serialize;

use crate::error::Anomaly;

/// Every anomaly the book can count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum StatKind {
    UnknownEventKind,
    MissingSeparator,
    WrongFieldCount,
    NonPositiveId,
    InvalidId,
    InvalidSide,
    NonPositiveQuantity,
    InvalidQuantity,
    NonPositivePrice,
    InvalidPrice,
    MissingPriceLevel,
    NoOrderForModify,
    DuplicateOrderId,
    CrossedBookWhilePending,
}

impl StatKind {
    pub const COUNT: usize = 14;

    pub const ALL: [StatKind; Self::COUNT] = [
        StatKind::UnknownEventKind,
        StatKind::MissingSeparator,
        StatKind::WrongFieldCount,
        StatKind::NonPositiveId,
        StatKind::InvalidId,
        StatKind::InvalidSide,
        StatKind::NonPositiveQuantity,
        StatKind::InvalidQuantity,
        StatKind::NonPositivePrice,
        StatKind::InvalidPrice,
        StatKind::MissingPriceLevel,
        StatKind::NoOrderForModify,
        StatKind::DuplicateOrderId,
        StatKind::CrossedBookWhilePending,
    ];

    /// Label used in the rendered summary.
    pub fn label(self) -> &'static str {
        match self {
            StatKind::UnknownEventKind => "Unknown event kind",
            StatKind::MissingSeparator => "Missing separator",
            StatKind::WrongFieldCount => "Wrong field count",
            StatKind::NonPositiveId => "Order range",
            StatKind::InvalidId => "Order syntax",
            StatKind::InvalidSide => "Side error",
            StatKind::NonPositiveQuantity => "Quantity range",
            StatKind::InvalidQuantity => "Quantity syntax",
            StatKind::NonPositivePrice => "Price range",
            StatKind::InvalidPrice => "Price syntax",
            StatKind::MissingPriceLevel => "Missing price level",
            StatKind::NoOrderForModify => "No order id with cancel or modify",
            StatKind::DuplicateOrderId => "Duplicate order id",
            StatKind::CrossedBookWhilePending => "Crossed book while match pending",
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Monotonic per-kind counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    counts: [u64; StatKind::COUNT],
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter for `kind`.
    #[inline]
    pub fn record(&mut self, kind: StatKind) {
        self.counts[kind.index()] += 1;
    }

    /// Increment the counter matching an anomaly.
    #[inline]
    pub fn record_anomaly(&mut self, anomaly: &Anomaly) {
        self.record(anomaly.kind());
    }

    /// Current value of one counter.
    #[inline]
    pub fn get(&self, kind: StatKind) -> u64 {
        self.counts[kind.index()]
    }

    /// Sum over all counters.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Iterate `(kind, count)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (StatKind, u64)> + '_ {
        StatKind::ALL.iter().map(|&k| (k, self.get(k)))
    }
}

impl Serialize for Stats {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(StatKind::COUNT))?;
        for (kind, count) in self.iter() {
            map.serialize_entry(&kind, &count)?;
        }
        map.end()
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Error summary")?;
        for (kind, count) in self.iter() {
            writeln!(f, "{}:{:3}", kind.label(), count)?;
        }
        Ok(())
    }
}
