//! Market Data Service
//!
//! Turns engine output into the public feed: depth updates, an
//! anonymized trade stream, and status notices, fanned out through
//! per-subscriber bounded queues.
//!
//! Topics: `trades.<symbol>`, `depth.<symbol>`, `status`.

pub mod depth;
pub mod publisher;
pub mod trades;

pub use depth::DepthUpdate;
pub use publisher::{topics, FeedHub, FeedMessage};
pub use trades::{PublicTrade, TradeBuffer};
