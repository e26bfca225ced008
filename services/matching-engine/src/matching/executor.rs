//! Trade construction
//!
//! Builds trade records at match time and owns the trade id sequence.
//! Books on different instruments share one sequence through the cloned
//! counter, so trade ids are strictly increasing process-wide.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use types::ids::{OrderId, Symbol, TradeId, UserId};
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};
use types::trade::Trade;

/// Builds trades with monotonically increasing ids.
#[derive(Debug, Clone)]
pub struct MatchExecutor {
    sequence: Arc<AtomicU64>,
}

impl MatchExecutor {
    /// Executor with a fresh id sequence starting at 1.
    pub fn new() -> Self {
        Self {
            sequence: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Executor sharing an existing id sequence (one per process).
    pub fn with_sequence(sequence: Arc<AtomicU64>) -> Self {
        Self { sequence }
    }

    fn next_trade_id(&self) -> TradeId {
        TradeId::new(self.sequence.fetch_add(1, Ordering::Relaxed))
    }

    /// Build the trade for one fill between the aggressor and a resting
    /// maker. The execution price is the maker's level price; both real
    /// counterparty user ids are recorded.
    pub fn execute(
        &self,
        symbol: &Symbol,
        taker: &Order,
        maker_order_id: OrderId,
        maker_user_id: UserId,
        price: Price,
        quantity: Quantity,
        executed_at: i64,
    ) -> Trade {
        let (buy_order_id, sell_order_id, buy_user_id, sell_user_id) = match taker.side {
            Side::Buy => (taker.order_id, maker_order_id, taker.user_id, maker_user_id),
            Side::Sell => (maker_order_id, taker.order_id, maker_user_id, taker.user_id),
        };

        Trade::new(
            self.next_trade_id(),
            symbol.clone(),
            buy_order_id,
            sell_order_id,
            buy_user_id,
            sell_user_id,
            quantity,
            price,
            taker.side,
            executed_at,
        )
    }
}

impl Default for MatchExecutor {
    fn default() -> Self {
        Self::new()
    }
}
