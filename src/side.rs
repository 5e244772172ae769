//! Order side: Buy or Sell

use std::fmt;

use serde::{Deserialize, Serialize};

/// Side of an order or trade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Returns the opposite side.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Wire token for this side (`B` or `S`).
    #[inline]
    pub fn as_token(self) -> &'static str {
        match self {
            Side::Buy => "B",
            Side::Sell => "S",
        }
    }

    /// Parse a wire token. Only the exact strings `B` and `S` are accepted.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "B" => Some(Side::Buy),
            "S" => Some(Side::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn opposite_is_involution() {
        assert_eq!(Side::Buy.opposite().opposite(), Side::Buy);
        assert_eq!(Side::Sell.opposite().opposite(), Side::Sell);
    }

    #[test]
    fn token_round_trip() {
        assert_eq!(Side::from_token("B"), Some(Side::Buy));
        assert_eq!(Side::from_token("S"), Some(Side::Sell));
        assert_eq!(format!("{}", Side::Buy), "B");
        assert_eq!(format!("{}", Side::Sell), "S");
    }

    #[test]
    fn rejects_other_tokens() {
        assert_eq!(Side::from_token("C"), None);
        assert_eq!(Side::from_token(""), None);
        assert_eq!(Side::from_token("b"), None);
        assert_eq!(Side::from_token("BS"), None);
    }
}
