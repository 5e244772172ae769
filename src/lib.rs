//! # mdsim
//!
//! A price-level limit order book fed by a line-oriented market-data stream,
//! a generator that synthesizes realistic streams for it, and a consumer that
//! replays them.
//!
//! ## Features
//!
//! - **Price-level book**: per-price maps of order id → resting quantity
//! - **Exact prices**: decimal prices, no binary floating point on the book
//! - **Anomaly accounting**: malformed or inconsistent events are counted, never fatal
//! - **Pending-match monitor**: flags adds that arrive while a crossing order awaits its trades
//! - **Deterministic generation**: seeded strategies and error injection
//! - **Asynchronous rendering**: snapshots rendered on their own thread
//!
//! ## Wire Format
//!
//! ```text
//! A,<orderId>,<B|S>,<quantity>,<price>    add
//! M,<orderId>,<B|S>,<quantity>,<price>    modify (replace quantity)
//! X,<orderId>,<B|S>,<quantity>,<price>    cancel (reduce or remove)
//! T,<B|S>,<quantity>,<price>              trade
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use mdsim::{OrderBook, Price};
//!
//! let mut book = OrderBook::new();
//! book.process_line("A,1,B,5,1000").unwrap();
//! book.process_line("A,2,S,3,1050").unwrap();
//!
//! assert_eq!(book.top_bid(), Some(Price::from(1000)));
//! assert_eq!(book.mid(), Some(1025.0));
//!
//! // Malformed lines are counted and skipped
//! assert!(book.process_line("A,3,Q,5,1000").is_err());
//! assert_eq!(book.stats().total(), 1);
//! ```
//!
//! ## Generating a Stream
//!
//! ```
//! use mdsim::{Config, Generator, OrderBook};
//!
//! let mut generator = Generator::from_config(&Config::default()).unwrap();
//! generator.create_order_book();
//! generator.generate(1_000);
//!
//! // Replaying the emitted lines rebuilds the generator's book
//! let mut replica = OrderBook::new();
//! for emission in generator.drain_emitted() {
//!     replica.process_line(&emission.to_string()).unwrap();
//! }
//! assert_eq!(replica.resting_orders(), generator.book().resting_orders());
//! ```
//!
//! ## Snapshots
//!
//! ```
//! use mdsim::{OrderBook, Price};
//!
//! let mut book = OrderBook::new();
//! book.process_line("A,1,B,5,1000").unwrap();
//! book.process_line("A,2,B,2,1000").unwrap();
//! book.process_line("A,3,S,4,1050").unwrap();
//!
//! let snap = book.snapshot(5);
//! assert_eq!(snap.best_bid(), Some(Price::from(1000)));
//! assert_eq!(snap.bids[0].order_count, 2);
//! assert_eq!(snap.spread(), Some(Price::from(50)));
//! print!("{snap}");
//! ```

mod book;
pub mod codec;
pub mod config;
pub mod error;
mod event;
pub mod generator;
pub mod injector;
mod level;
pub mod monitor;
mod order;
mod price_levels;
pub mod processor;
pub mod render;
mod side;
mod snapshot;
pub mod stats;
pub mod strategy;
mod trade;
mod types;

// Re-export public API
pub use book::OrderBook;
pub use codec::{EventKind, decode};
pub use config::{Config, OutputFormat};
pub use error::{Anomaly, Error, Result};
pub use event::Event;
pub use generator::{Emission, Generator};
pub use injector::{ErrorInjector, InjectorKind, NoInjection, RandomInjector};
pub use level::Level;
pub use order::Order;
pub use price_levels::PriceLevels;
pub use processor::{ProcessSummary, Processor};
pub use render::SnapshotRenderer;
pub use side::Side;
pub use snapshot::{BookSnapshot, DEFAULT_DEPTH, LevelSnapshot};
pub use stats::{StatKind, Stats};
pub use strategy::{RandomStrategy, SelectionStrategy, StrategyKind};
pub use trade::Trade;
pub use types::{OrderId, OrderIdGen, Price, Quantity};
