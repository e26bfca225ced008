//! Public trade stream
//!
//! Strips counterparty identities from executed trades, assigns a
//! per-symbol publication sequence, and keeps a bounded history for
//! late subscribers.

use std::collections::VecDeque;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use types::ids::{Symbol, TradeId};
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::trade::Trade;

/// A trade as broadcast to clients. No account information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicTrade {
    pub trade_id: TradeId,
    /// Per-symbol monotonic publication sequence.
    pub sequence: u64,
    pub symbol: Symbol,
    pub price: Price,
    pub quantity: Quantity,
    /// price × quantity.
    pub value: Decimal,
    pub taker_side: Side,
    pub timestamp: i64,
}

/// Bounded per-symbol publication buffer.
#[derive(Debug)]
pub struct TradeBuffer {
    symbol: Symbol,
    sequence: u64,
    history: VecDeque<PublicTrade>,
    max_history: usize,
}

impl TradeBuffer {
    pub fn new(symbol: Symbol, max_history: usize) -> Self {
        Self {
            symbol,
            sequence: 0,
            history: VecDeque::with_capacity(max_history),
            max_history,
        }
    }

    /// Convert an engine trade into its public form and retain it.
    pub fn record(&mut self, trade: &Trade) -> PublicTrade {
        self.sequence += 1;
        let public = PublicTrade {
            trade_id: trade.trade_id,
            sequence: self.sequence,
            symbol: self.symbol.clone(),
            price: trade.price,
            quantity: trade.quantity,
            value: trade.notional(),
            taker_side: trade.taker_side,
            timestamp: trade.executed_at,
        };

        if self.history.len() >= self.max_history {
            self.history.pop_front();
        }
        self.history.push_back(public.clone());
        public
    }

    /// Most recent `count` public trades, newest first.
    pub fn recent(&self, count: usize) -> Vec<PublicTrade> {
        self.history.iter().rev().take(count).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
