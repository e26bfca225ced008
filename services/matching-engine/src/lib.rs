//! Matching Engine Service
//!
//! Price-time-priority matching for a configured set of instruments:
//! per-instrument books behind reader-writer locks, a bounded ingress
//! queue feeding a worker pool, a pre-trade risk gate, and sink
//! interfaces for responses, trades, and market data.
//!
//! Matching is deterministic: same submission sequence, same trades.

pub mod book;
pub mod clock;
pub mod engine;
pub mod events;
pub mod matching;
pub mod queue;
pub mod stats;

pub use engine::{Engine, EngineStatus};
pub use events::{EngineSinks, MarketDataSink, ResponseSink, TradeSink};
