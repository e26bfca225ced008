//! Per-user position tracking types

use crate::ids::{Symbol, UserId};
use crate::numeric::{Price, Quantity};
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Net position of one user in one instrument.
///
/// Created on the first trade and updated on every subsequent fill and
/// market-price refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub user_id: UserId,
    pub symbol: Symbol,
    /// Signed net position: buys minus sells.
    pub net_position: Decimal,
    /// Net position marked at the last known market price.
    pub notional_value: Decimal,
    pub buy_quantity: Decimal,
    pub sell_quantity: Decimal,
}

impl Position {
    pub fn new(user_id: UserId, symbol: Symbol) -> Self {
        Self {
            user_id,
            symbol,
            net_position: Decimal::ZERO,
            notional_value: Decimal::ZERO,
            buy_quantity: Decimal::ZERO,
            sell_quantity: Decimal::ZERO,
        }
    }

    /// Apply one fill to this position.
    pub fn apply_fill(&mut self, side: Side, quantity: Quantity, price: Price) {
        let qty = quantity.as_decimal();
        match side {
            Side::Buy => {
                self.net_position += qty;
                self.buy_quantity += qty;
            }
            Side::Sell => {
                self.net_position -= qty;
                self.sell_quantity += qty;
            }
        }
        self.notional_value = self.net_position * price.as_decimal();
    }

    /// Re-mark the notional value at a new market price.
    pub fn mark(&mut self, price: Price) {
        self.notional_value = self.net_position * price.as_decimal();
    }

    /// Projected net position if a further quantity traded on `side`.
    pub fn projected(&self, side: Side, quantity: Quantity) -> Decimal {
        match side {
            Side::Buy => self.net_position + quantity.as_decimal(),
            Side::Sell => self.net_position - quantity.as_decimal(),
        }
    }
}
