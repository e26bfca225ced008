//! Trade execution types
//!
//! A trade references its orders and owners by id only; it never holds a
//! reference back into the book, so order deletion after a fill cannot
//! dangle.

use crate::ids::{OrderId, Symbol, TradeId, UserId};
use crate::numeric::{notional, Price, Quantity};
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One execution between a resting order and an aggressor.
///
/// The price is always the resting (maker) order's limit price at the
/// moment of the fill. Both counterparty user ids are carried so position
/// keeping downstream never has to guess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub symbol: Symbol,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub buy_user_id: UserId,
    pub sell_user_id: UserId,
    pub quantity: Quantity,
    pub price: Price,
    /// Side of the aggressor that drove this match.
    pub taker_side: Side,
    /// Wall-clock execution time, Unix nanoseconds.
    pub executed_at: i64,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        trade_id: TradeId,
        symbol: Symbol,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        buy_user_id: UserId,
        sell_user_id: UserId,
        quantity: Quantity,
        price: Price,
        taker_side: Side,
        executed_at: i64,
    ) -> Self {
        Self {
            trade_id,
            symbol,
            buy_order_id,
            sell_order_id,
            buy_user_id,
            sell_user_id,
            quantity,
            price,
            taker_side,
            executed_at,
        }
    }

    /// Trade value: price × quantity.
    pub fn notional(&self) -> Decimal {
        notional(self.price, self.quantity)
    }

    /// Order id of the aggressor side.
    pub fn taker_order_id(&self) -> OrderId {
        match self.taker_side {
            Side::Buy => self.buy_order_id,
            Side::Sell => self.sell_order_id,
        }
    }

    /// Order id of the resting side.
    pub fn maker_order_id(&self) -> OrderId {
        match self.taker_side {
            Side::Buy => self.sell_order_id,
            Side::Sell => self.buy_order_id,
        }
    }
}
