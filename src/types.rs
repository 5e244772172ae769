//! Core types: Price, Quantity, OrderId

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Price as an exact decimal.
///
/// Feed prices are not required to sit on the tick grid, so the book keeps
/// whatever the wire carried without rounding through binary floating point.
/// `Price::from(900)` and `"900".parse::<Price>()` compare equal to
/// `"900.00".parse::<Price>()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Price = Price(Decimal::ZERO);

    /// Wrap a decimal value.
    #[inline]
    pub fn new(value: Decimal) -> Self {
        Price(value)
    }

    /// Returns true if the price is strictly greater than zero.
    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Move this price by `ticks` increments of `tick` (negative moves down).
    pub fn offset(self, tick: Price, ticks: i64) -> Price {
        Price(self.0 + tick.0 * Decimal::from(ticks))
    }

    /// Number of whole ticks between `self` and a higher price `upper`,
    /// truncated toward zero.
    pub fn ticks_to(self, upper: Price, tick: Price) -> i64 {
        if tick.0.is_zero() {
            return 0;
        }
        ((upper.0 - self.0) / tick.0).trunc().to_i64().unwrap_or(0)
    }

    /// Lossy conversion for display and mid-price arithmetic.
    pub fn to_f64(self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }
}

impl From<i64> for Price {
    fn from(value: i64) -> Self {
        Price(Decimal::from(value))
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Price)
    }
}

impl Add for Price {
    type Output = Price;

    fn add(self, rhs: Price) -> Price {
        Price(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Price;

    fn sub(self, rhs: Price) -> Price {
        Price(self.0 - rhs.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Normalized so that tick-aligned integer prices print without a fraction
        fmt::Display::fmt(&self.0.normalize(), f)
    }
}

/// Quantity of contracts. Always positive on the wire.
pub type Quantity = u64;

/// Order identifier carried on the feed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic order id source used by the generator.
///
/// The first id handed out is `start + 1`.
#[derive(Clone, Debug)]
pub struct OrderIdGen {
    last: u64,
}

impl OrderIdGen {
    pub fn new(start: u64) -> Self {
        Self { last: start }
    }

    /// Generate the next order id.
    pub fn next_id(&mut self) -> OrderId {
        self.last += 1;
        OrderId(self.last)
    }

    /// The most recently generated id (or the start value).
    pub fn last(&self) -> OrderId {
        OrderId(self.last)
    }
}
