//! Wire codec for the line-oriented feed.
//!
//! ```text
//! A,<orderId>,<B|S>,<quantity>,<price>
//! M,<orderId>,<B|S>,<quantity>,<price>
//! X,<orderId>,<B|S>,<quantity>,<price>
//! T,<B|S>,<quantity>,<price>
//! ```
//!
//! Decoding is strict: fields are not trimmed and the side token must be
//! exactly `B` or `S`. Encoding is the `Display` impl of [`Event`].

use std::fmt;
use std::str::FromStr;

use crate::error::{CodecError, DecodeError, OrderFieldError};
use crate::event::Event;
use crate::{Order, OrderId, Price, Quantity, Side, Trade};

/// Leading byte of a wire line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Add,
    Modify,
    Cancel,
    Trade,
}

impl EventKind {
    /// Map the leading byte of a line.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'A' => Some(EventKind::Add),
            b'M' => Some(EventKind::Modify),
            b'X' => Some(EventKind::Cancel),
            b'T' => Some(EventKind::Trade),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            EventKind::Add => 'A',
            EventKind::Modify => 'M',
            EventKind::Cancel => 'X',
            EventKind::Trade => 'T',
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

const ORDER_FIELDS: usize = 4;
const TRADE_FIELDS: usize = 3;

/// Split a line into its event kind and payload.
///
/// Trailing `\r` and `\n` are ignored. An empty line has no kind.
pub fn parse_event(line: &str) -> Result<(EventKind, &str), CodecError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let bytes = line.as_bytes();

    let kind = bytes
        .first()
        .and_then(|&b| EventKind::from_byte(b))
        .ok_or(CodecError::UnknownEventKind)?;
    if bytes.get(1) != Some(&b',') {
        return Err(CodecError::MissingSeparator);
    }
    // Both leading bytes are ASCII, so index 2 is a char boundary
    Ok((kind, &line[2..]))
}

/// Parse an order payload: `id,side,quantity,price`.
///
/// Fields are checked in order; the first failure wins.
pub fn parse_order(payload: &str) -> Result<Order, OrderFieldError> {
    let fields: Vec<&str> = payload.split(',').collect();
    if fields.len() != ORDER_FIELDS {
        return Err(OrderFieldError::WrongFieldCount {
            expected: ORDER_FIELDS,
            found: fields.len(),
        });
    }

    let id = parse_positive(
        fields[0],
        OrderFieldError::InvalidId,
        OrderFieldError::NonPositiveId,
    )?;
    let side = parse_side(fields[1])?;
    let quantity = parse_quantity(fields[2])?;
    let price = parse_price(fields[3])?;

    Ok(Order::new(OrderId(id), side, quantity, price))
}

/// Parse a trade payload: `side,quantity,price`.
pub fn parse_trade(payload: &str) -> Result<Trade, OrderFieldError> {
    let fields: Vec<&str> = payload.split(',').collect();
    if fields.len() != TRADE_FIELDS {
        return Err(OrderFieldError::WrongFieldCount {
            expected: TRADE_FIELDS,
            found: fields.len(),
        });
    }

    let side = parse_side(fields[0])?;
    let quantity = parse_quantity(fields[1])?;
    let price = parse_price(fields[2])?;

    Ok(Trade::new(side, quantity, price))
}

/// Decode a full wire line.
pub fn decode(line: &str) -> Result<Event, DecodeError> {
    let (kind, payload) = parse_event(line)?;
    let event = match kind {
        EventKind::Add => Event::Add(parse_order(payload)?),
        EventKind::Modify => Event::Modify(parse_order(payload)?),
        EventKind::Cancel => Event::Cancel(parse_order(payload)?),
        EventKind::Trade => Event::Trade(parse_trade(payload)?),
    };
    Ok(event)
}

fn parse_side(field: &str) -> Result<Side, OrderFieldError> {
    Side::from_token(field).ok_or(OrderFieldError::InvalidSide)
}

fn parse_quantity(field: &str) -> Result<Quantity, OrderFieldError> {
    parse_positive(
        field,
        OrderFieldError::InvalidQuantity,
        OrderFieldError::NonPositiveQuantity,
    )
}

/// Integers are read signed so that `-5` is out of range rather than
/// malformed.
fn parse_positive(
    field: &str,
    malformed: OrderFieldError,
    out_of_range: OrderFieldError,
) -> Result<u64, OrderFieldError> {
    let value = i64::from_str(field).map_err(|_| malformed)?;
    if value <= 0 {
        return Err(out_of_range);
    }
    Ok(value as u64)
}

fn parse_price(field: &str) -> Result<Price, OrderFieldError> {
    let price = Price::from_str(field).map_err(|_| OrderFieldError::InvalidPrice)?;
    if !price.is_positive() {
        return Err(OrderFieldError::NonPositivePrice);
    }
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Price {
        s.parse().unwrap()
    }

    #[test]
    fn parse_event_splits_kind() {
        assert_eq!(parse_event("A,1,B,2,3"), Ok((EventKind::Add, "1,B,2,3")));
        assert_eq!(parse_event("T,S,1,3\r\n"), Ok((EventKind::Trade, "S,1,3")));
        assert_eq!(parse_event("X,"), Ok((EventKind::Cancel, "")));
    }

    #[test]
    fn parse_event_errors() {
        assert_eq!(parse_event(""), Err(CodecError::UnknownEventKind));
        assert_eq!(parse_event("\n"), Err(CodecError::UnknownEventKind));
        assert_eq!(parse_event(",1,B,2,3"), Err(CodecError::UnknownEventKind));
        assert_eq!(parse_event("a,1,B,2,3"), Err(CodecError::UnknownEventKind));
        assert_eq!(parse_event("é,1"), Err(CodecError::UnknownEventKind));
        assert_eq!(parse_event("A;1,B,2,3"), Err(CodecError::MissingSeparator));
        assert_eq!(parse_event("M"), Err(CodecError::MissingSeparator));
    }

    #[test]
    fn parse_order_ok() {
        let order = parse_order("1000,B,5,912.50").unwrap();
        assert_eq!(order, Order::new(OrderId(1000), Side::Buy, 5, p("912.5")));
    }

    #[test]
    fn parse_order_field_count() {
        assert_eq!(
            parse_order("1,B,5"),
            Err(OrderFieldError::WrongFieldCount {
                expected: 4,
                found: 3
            })
        );
        assert_eq!(
            parse_order("1,B,5,100,7"),
            Err(OrderFieldError::WrongFieldCount {
                expected: 4,
                found: 5
            })
        );
    }

    #[test]
    fn parse_order_field_errors() {
        let cases = [
            ("0,B,5,100", OrderFieldError::NonPositiveId),
            ("-3,B,5,100", OrderFieldError::NonPositiveId),
            ("x1,B,5,100", OrderFieldError::InvalidId),
            ("1,Q,5,100", OrderFieldError::InvalidSide),
            ("1,,5,100", OrderFieldError::InvalidSide),
            ("1,b,5,100", OrderFieldError::InvalidSide),
            ("1,B,0,100", OrderFieldError::NonPositiveQuantity),
            ("1,B,five,100", OrderFieldError::InvalidQuantity),
            ("1,B,5,0", OrderFieldError::NonPositivePrice),
            ("1,B,5,-12.5", OrderFieldError::NonPositivePrice),
            ("1,B,5,abc", OrderFieldError::InvalidPrice),
        ];
        for (payload, expected) in cases {
            assert_eq!(parse_order(payload), Err(expected), "payload {payload:?}");
        }
    }

    #[test]
    fn first_failing_field_wins() {
        assert_eq!(parse_order("0,Q,0,0"), Err(OrderFieldError::NonPositiveId));
        assert_eq!(parse_order("1,Q,0,0"), Err(OrderFieldError::InvalidSide));
        assert_eq!(
            parse_order("1,S,0,0"),
            Err(OrderFieldError::NonPositiveQuantity)
        );
    }

    #[test]
    fn parse_trade_ok_and_errors() {
        assert_eq!(
            parse_trade("S,3,1050"),
            Ok(Trade::new(Side::Sell, 3, p("1050")))
        );
        assert_eq!(
            parse_trade("1,S,3,1050"),
            Err(OrderFieldError::WrongFieldCount {
                expected: 3,
                found: 4
            })
        );
        assert_eq!(parse_trade("S,3,0"), Err(OrderFieldError::NonPositivePrice));
    }

    #[test]
    fn decode_dispatches_on_kind() {
        let order = Order::new(OrderId(7), Side::Sell, 2, p("100"));
        assert_eq!(decode("A,7,S,2,100"), Ok(Event::Add(order)));
        assert_eq!(decode("M,7,S,2,100"), Ok(Event::Modify(order)));
        assert_eq!(decode("X,7,S,2,100"), Ok(Event::Cancel(order)));
        assert_eq!(
            decode("T,B,2,100"),
            Ok(Event::Trade(Trade::new(Side::Buy, 2, p("100"))))
        );
        assert_eq!(
            decode("T,7,S,2,100"),
            Err(DecodeError::Field(OrderFieldError::WrongFieldCount {
                expected: 3,
                found: 4
            }))
        );
        assert_eq!(
            decode(",7,S,2,100"),
            Err(DecodeError::Codec(CodecError::UnknownEventKind))
        );
    }
}
