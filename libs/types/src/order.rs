//! Order lifecycle types
//!
//! An order's kind is a tagged variant; per-kind data (the iceberg peak)
//! travels with the tag instead of a subclass hierarchy.

use crate::ids::{OrderId, Symbol, UserId};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order kind with per-kind fields bundled into the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum OrderKind {
    /// Rest at the limit price after taking available liquidity.
    Limit,
    /// Take liquidity at any price; never rests.
    Market,
    /// Immediate-or-cancel: fill what is available, cancel the rest.
    Ioc,
    /// Fill-or-kill: fill completely or cancel with zero trades.
    Fok,
    /// Limit order that displays at most `peak` quantity at a time.
    Iceberg { peak: Quantity },
}

impl OrderKind {
    /// Whether any unfilled remainder may rest on the book.
    pub fn may_rest(&self) -> bool {
        matches!(self, OrderKind::Limit | OrderKind::Iceberg { .. })
    }

    /// Whether the kind requires a limit price.
    pub fn requires_price(&self) -> bool {
        !matches!(self, OrderKind::Market)
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderKind::Limit => "LIMIT",
            OrderKind::Market => "MARKET",
            OrderKind::Ioc => "IOC",
            OrderKind::Fok => "FOK",
            OrderKind::Iceberg { .. } => "ICEBERG",
        }
    }
}

/// Order status.
///
/// `Pending` covers the window between queue admission and matching;
/// every other status is derived from the fill state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    New,
    Partial,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// A client order as processed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub symbol: Symbol,
    pub side: Side,
    pub kind: OrderKind,
    /// Limit price; `None` only for MARKET orders.
    pub price: Option<Price>,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub status: OrderStatus,
    /// Ingress timestamp, monotonic nanoseconds.
    pub timestamp: i64,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: OrderId,
        user_id: UserId,
        symbol: Symbol,
        side: Side,
        kind: OrderKind,
        price: Option<Price>,
        quantity: Quantity,
        timestamp: i64,
    ) -> Self {
        Self {
            order_id,
            user_id,
            symbol,
            side,
            kind,
            price,
            quantity,
            filled_quantity: Quantity::ZERO,
            status: OrderStatus::Pending,
            timestamp,
        }
    }

    pub fn remaining(&self) -> Quantity {
        self.quantity.saturating_sub(self.filled_quantity)
    }

    pub fn is_filled(&self) -> bool {
        self.filled_quantity == self.quantity
    }

    pub fn has_fills(&self) -> bool {
        !self.filled_quantity.is_zero()
    }

    /// Apply a fill and refresh the status from the fill state.
    ///
    /// # Panics
    /// Panics if the fill exceeds the remaining quantity.
    pub fn add_fill(&mut self, quantity: Quantity) {
        let new_filled = self.filled_quantity + quantity;
        assert!(
            new_filled <= self.quantity,
            "fill exceeds order quantity: {} + {} > {}",
            self.filled_quantity,
            quantity,
            self.quantity
        );
        self.filled_quantity = new_filled;
        self.status = if self.is_filled() {
            OrderStatus::Filled
        } else {
            OrderStatus::Partial
        };
    }
}

/// A client-facing order submission, before the engine assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub user_id: UserId,
    pub symbol: Symbol,
    pub side: Side,
    pub kind: OrderKind,
    pub price: Option<Price>,
    pub quantity: Quantity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
}

/// Terminal report for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub filled_quantity: Quantity,
    /// Volume-weighted average fill price, if anything filled.
    pub average_price: Option<Price>,
    pub message: String,
}

impl OrderResponse {
    pub fn rejected(order_id: OrderId, message: impl Into<String>) -> Self {
        Self {
            order_id,
            status: OrderStatus::Rejected,
            filled_quantity: Quantity::ZERO,
            average_price: None,
            message: message.into(),
        }
    }
}
