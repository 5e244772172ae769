//! Error types.
//!
//! Feed anomalies (`CodecError`, `OrderFieldError`, `BookStateError`,
//! `ConsistencyAnomaly`) are recoverable: the book counts them and keeps
//! going. [`Error`] covers operational failures of the tools themselves.

use std::path::PathBuf;

use crate::stats::StatKind;

/// The event kind byte or its separator is wrong.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("event kind is not one of A, M, X, T")]
    UnknownEventKind,
    #[error("separator missing after event kind")]
    MissingSeparator,
}

/// A field of an order or trade payload is missing or out of range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum OrderFieldError {
    #[error("expected {expected} fields, found {found}")]
    WrongFieldCount { expected: usize, found: usize },
    #[error("order id is not a positive integer")]
    NonPositiveId,
    #[error("order id is not numeric")]
    InvalidId,
    #[error("side is not B or S")]
    InvalidSide,
    #[error("quantity is not a positive integer")]
    NonPositiveQuantity,
    #[error("quantity is not numeric")]
    InvalidQuantity,
    #[error("price is not positive")]
    NonPositivePrice,
    #[error("price is not numeric")]
    InvalidPrice,
}

/// The event is well formed but does not fit the current book.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BookStateError {
    #[error("no price level for order")]
    MissingPriceLevel,
    #[error("no order id at price level for modify or cancel")]
    NoOrderForModify,
    #[error("order id already resting")]
    DuplicateOrderId,
}

/// Raised by the pending-match monitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConsistencyAnomaly {
    #[error("order crossed the book while a match was still pending a trade")]
    CrossedBookWhilePending,
}

/// Failure to turn a line into an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Field(#[from] OrderFieldError),
}

/// Any counted anomaly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Anomaly {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Field(#[from] OrderFieldError),
    #[error(transparent)]
    Book(#[from] BookStateError),
    #[error(transparent)]
    Consistency(#[from] ConsistencyAnomaly),
}

impl From<DecodeError> for Anomaly {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Codec(e) => Anomaly::Codec(e),
            DecodeError::Field(e) => Anomaly::Field(e),
        }
    }
}

impl Anomaly {
    /// The counter this anomaly increments.
    pub fn kind(&self) -> StatKind {
        match self {
            Anomaly::Codec(CodecError::UnknownEventKind) => StatKind::UnknownEventKind,
            Anomaly::Codec(CodecError::MissingSeparator) => StatKind::MissingSeparator,
            Anomaly::Field(e) => match e {
                OrderFieldError::WrongFieldCount { .. } => StatKind::WrongFieldCount,
                OrderFieldError::NonPositiveId => StatKind::NonPositiveId,
                OrderFieldError::InvalidId => StatKind::InvalidId,
                OrderFieldError::InvalidSide => StatKind::InvalidSide,
                OrderFieldError::NonPositiveQuantity => StatKind::NonPositiveQuantity,
                OrderFieldError::InvalidQuantity => StatKind::InvalidQuantity,
                OrderFieldError::NonPositivePrice => StatKind::NonPositivePrice,
                OrderFieldError::InvalidPrice => StatKind::InvalidPrice,
            },
            Anomaly::Book(e) => match e {
                BookStateError::MissingPriceLevel => StatKind::MissingPriceLevel,
                BookStateError::NoOrderForModify => StatKind::NoOrderForModify,
                BookStateError::DuplicateOrderId => StatKind::DuplicateOrderId,
            },
            Anomaly::Consistency(ConsistencyAnomaly::CrossedBookWhilePending) => {
                StatKind::CrossedBookWhilePending
            }
        }
    }
}

/// Operational errors of the generator and processor tools.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("unknown selection strategy '{0}'")]
    UnknownStrategy(String),

    #[error("unknown error injector '{0}'")]
    UnknownInjector(String),

    #[error("snapshot renderer failed: {0}")]
    Render(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
