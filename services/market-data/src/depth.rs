//! Wire-facing depth updates
//!
//! Depth snapshots leave the book as aggregated visible quantities;
//! this module stamps them for publication.

use serde::{Deserialize, Serialize};

use matching_engine::book::order_book::{Depth, DepthLevel};
use types::ids::Symbol;
use types::numeric::Quantity;

/// A published depth snapshot for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthUpdate {
    pub symbol: Symbol,
    /// Best bid first (price descending).
    pub bids: Vec<DepthLevel>,
    /// Best ask first (price ascending).
    pub asks: Vec<DepthLevel>,
    /// Unix nanoseconds at publication.
    pub timestamp: i64,
}

impl DepthUpdate {
    pub fn from_depth(depth: &Depth, timestamp: i64) -> Self {
        Self {
            symbol: depth.symbol.clone(),
            bids: depth.bids.clone(),
            asks: depth.asks.clone(),
            timestamp,
        }
    }

    pub fn total_bid_quantity(&self) -> Quantity {
        self.bids
            .iter()
            .fold(Quantity::ZERO, |acc, l| acc + l.quantity)
    }

    pub fn total_ask_quantity(&self) -> Quantity {
        self.asks
            .iter()
            .fold(Quantity::ZERO, |acc, l| acc + l.quantity)
    }

    /// A publishable snapshot is never crossed.
    pub fn is_consistent(&self) -> bool {
        match (self.bids.first(), self.asks.first()) {
            (Some(bid), Some(ask)) => bid.price < ask.price,
            _ => true,
        }
    }
}
