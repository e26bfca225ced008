//! Order book infrastructure
//!
//! Price levels, the two book sides, and the per-instrument book that
//! runs the matching algorithms.

pub mod ask_book;
pub mod bid_book;
pub mod order_book;
pub mod price_level;

pub use ask_book::AskBook;
pub use bid_book::BidBook;
pub use order_book::{BookOrderView, Depth, DepthLevel, ModifyResult, OrderBook};
pub use price_level::{IcebergState, PriceLevel, RestingOrder};
