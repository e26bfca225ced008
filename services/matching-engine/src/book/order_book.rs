//! Per-instrument order book and matching
//!
//! One `OrderBook` owns both sides of a single instrument plus the
//! id index and the recent-trades ring. It is single-threaded by
//! construction; the engine serializes access through a per-instrument
//! lock.
//!
//! Matching is price-time priority: best price first, FIFO within a
//! price, execution at the resting (maker) order's price. During a
//! sweep the book may be transiently crossed; the invariant is checked
//! before control returns to the caller.

use std::collections::{HashMap, VecDeque};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::error;

use types::errors::BookError;
use types::ids::{OrderId, Symbol, UserId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderKind, OrderStatus, Side};
use types::trade::Trade;

use super::ask_book::AskBook;
use super::bid_book::BidBook;
use super::price_level::{FrontFill, IcebergState, Reduce, RestingOrder};
use crate::matching::crossing;
use crate::matching::executor::MatchExecutor;

/// One aggregated price level in a depth snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Price,
    /// Visible quantity only; hidden iceberg remainders are excluded.
    pub quantity: Quantity,
    pub order_count: usize,
}

/// Top-N aggregated view of both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Depth {
    pub symbol: Symbol,
    /// Price-descending (best bid first).
    pub bids: Vec<DepthLevel>,
    /// Price-ascending (best ask first).
    pub asks: Vec<DepthLevel>,
}

/// One displayed resting order, for the book dump.
#[derive(Debug, Clone, PartialEq)]
pub struct BookOrderView {
    pub order_id: OrderId,
    pub quantity: Quantity,
    pub price: Price,
}

/// Outcome of a modify request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModifyResult {
    pub modified: bool,
    /// Trades executed if the modification re-entered matching.
    pub trades: Vec<Trade>,
}

impl ModifyResult {
    fn not_found() -> Self {
        Self {
            modified: false,
            trades: Vec::new(),
        }
    }

    fn quiet() -> Self {
        Self {
            modified: true,
            trades: Vec::new(),
        }
    }
}

/// Price-time-priority book for a single instrument.
#[derive(Debug)]
pub struct OrderBook {
    symbol: Symbol,
    bids: BidBook,
    asks: AskBook,
    /// Live resting orders: id → (side, price level key).
    index: HashMap<OrderId, (Side, Price)>,
    executor: MatchExecutor,
    recent_trades: VecDeque<Trade>,
    trades_capacity: usize,
    total_volume: Decimal,
    total_orders: u64,
    /// Set when an index/level disagreement is detected; the engine
    /// treats a poisoned book as fatal.
    poisoned: bool,
}

impl OrderBook {
    pub fn new(symbol: Symbol, trades_capacity: usize) -> Self {
        Self::with_executor(symbol, trades_capacity, MatchExecutor::new())
    }

    /// Book sharing a process-wide trade id sequence.
    pub fn with_executor(symbol: Symbol, trades_capacity: usize, executor: MatchExecutor) -> Self {
        Self {
            symbol,
            bids: BidBook::new(),
            asks: AskBook::new(),
            index: HashMap::new(),
            executor,
            recent_trades: VecDeque::with_capacity(trades_capacity),
            trades_capacity,
            total_volume: Decimal::ZERO,
            total_orders: 0,
            poisoned: false,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Enter a new order, match it, and rest any remainder the kind
    /// permits. Returns the trades in execution order. The order's
    /// filled quantity and status are updated in place.
    ///
    /// `now` is the wall-clock timestamp stamped onto trades.
    pub fn submit(&mut self, order: &mut Order, now: i64) -> Result<Vec<Trade>, BookError> {
        if self.index.contains_key(&order.order_id) {
            return Err(BookError::DuplicateOrderId(order.order_id));
        }
        self.total_orders += 1;

        let trades = match order.kind {
            OrderKind::Limit | OrderKind::Iceberg { .. } => self.match_limit(order, now),
            OrderKind::Market => self.match_market(order, now),
            OrderKind::Ioc => self.match_ioc(order, now),
            OrderKind::Fok => self.match_fok(order, now),
        };

        self.check_uncrossed()?;
        Ok(trades)
    }

    /// Remove a live order. Returns false for unknown or terminal ids.
    pub fn cancel(&mut self, order_id: OrderId) -> bool {
        let Some((side, price)) = self.index.remove(&order_id) else {
            return false;
        };
        let removed = match side {
            Side::Buy => self.bids.remove(order_id, price),
            Side::Sell => self.asks.remove(order_id, price),
        };
        if removed.is_none() {
            error!(%order_id, %price, "index entry without a book entry");
            self.poisoned = true;
            return false;
        }
        true
    }

    /// Change a live order's quantity and/or price.
    ///
    /// A price change or a quantity increase forfeits time priority:
    /// the order is pulled and re-enters matching with a fresh
    /// timestamp. A quantity decrease at the same price shrinks the
    /// order in place; decreasing to at or below the filled quantity
    /// cancels the remainder.
    pub fn modify(
        &mut self,
        order_id: OrderId,
        new_quantity: Quantity,
        new_price: Option<Price>,
        now: i64,
    ) -> ModifyResult {
        let Some(&(side, price)) = self.index.get(&order_id) else {
            return ModifyResult::not_found();
        };
        let price_changed = new_price.is_some_and(|p| p != price);

        if !price_changed {
            let current = self
                .level_of(side, price)
                .and_then(|level| level.get(order_id))
                .map(|o| o.quantity);
            let Some(current) = current else {
                error!(%order_id, %price, "index entry without a book entry");
                self.poisoned = true;
                return ModifyResult::not_found();
            };

            if new_quantity <= current {
                let outcome = match side {
                    Side::Buy => self.bids.level_mut(price).map(|l| l.reduce(order_id, new_quantity)),
                    Side::Sell => self.asks.level_mut(price).map(|l| l.reduce(order_id, new_quantity)),
                };
                return match outcome {
                    Some(Reduce::Reduced) => ModifyResult::quiet(),
                    Some(Reduce::Removed(_)) => {
                        self.index.remove(&order_id);
                        match side {
                            Side::Buy => self.bids.prune(price),
                            Side::Sell => self.asks.prune(price),
                        }
                        ModifyResult::quiet()
                    }
                    Some(Reduce::NotFound) | None => {
                        error!(%order_id, %price, "index entry without a book entry");
                        self.poisoned = true;
                        ModifyResult::not_found()
                    }
                };
            }
            // Quantity increase falls through to cancel-and-resubmit.
        }

        self.index.remove(&order_id);
        let entry = match side {
            Side::Buy => self.bids.remove(order_id, price),
            Side::Sell => self.asks.remove(order_id, price),
        };
        let Some(entry) = entry else {
            error!(%order_id, %price, "index entry without a book entry");
            self.poisoned = true;
            return ModifyResult::not_found();
        };

        if new_quantity <= entry.filled {
            // Nothing left to work after the already-filled quantity.
            return ModifyResult::quiet();
        }

        let kind = match entry.iceberg {
            Some(ice) => OrderKind::Iceberg { peak: ice.peak },
            None => OrderKind::Limit,
        };
        let mut order = Order {
            order_id,
            user_id: entry.user_id,
            symbol: self.symbol.clone(),
            side,
            kind,
            price: Some(new_price.unwrap_or(price)),
            quantity: new_quantity,
            filled_quantity: entry.filled,
            status: if entry.filled.is_zero() {
                OrderStatus::New
            } else {
                OrderStatus::Partial
            },
            timestamp: now,
        };
        let trades = self.match_limit(&mut order, now);
        if self.check_uncrossed().is_err() {
            self.poisoned = true;
        }
        ModifyResult {
            modified: true,
            trades,
        }
    }

    /// Top-N aggregated depth; visible quantities only.
    pub fn depth(&self, levels: usize) -> Depth {
        let to_level = |(price, quantity, order_count): (Price, Quantity, usize)| DepthLevel {
            price,
            quantity,
            order_count,
        };
        Depth {
            symbol: self.symbol.clone(),
            bids: self.bids.depth(levels).into_iter().map(to_level).collect(),
            asks: self.asks.depth(levels).into_iter().map(to_level).collect(),
        }
    }

    /// Most recent `count` trades, newest first.
    pub fn recent_trades(&self, count: usize) -> Vec<Trade> {
        self.recent_trades.iter().rev().take(count).cloned().collect()
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    /// Best ask minus best bid; None unless both sides are populated.
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.as_decimal() - bid.as_decimal()),
            _ => None,
        }
    }

    pub fn contains(&self, order_id: OrderId) -> bool {
        self.index.contains_key(&order_id)
    }

    /// Owner of a live resting order.
    pub fn owner_of(&self, order_id: OrderId) -> Option<UserId> {
        let &(side, price) = self.index.get(&order_id)?;
        self.level_of(side, price)?.get(order_id).map(|o| o.user_id)
    }

    /// Displayed sell orders, price ascending, FIFO within a price.
    pub fn ask_orders(&self) -> Vec<BookOrderView> {
        self.asks
            .levels()
            .flat_map(|(price, level)| {
                level.iter().map(move |o| BookOrderView {
                    order_id: o.order_id,
                    quantity: o.visible(),
                    price,
                })
            })
            .collect()
    }

    /// Displayed buy orders, price descending, FIFO within a price.
    pub fn bid_orders(&self) -> Vec<BookOrderView> {
        self.bids
            .levels()
            .flat_map(|(price, level)| {
                level.iter().map(move |o| BookOrderView {
                    order_id: o.order_id,
                    quantity: o.visible(),
                    price,
                })
            })
            .collect()
    }

    pub fn total_volume(&self) -> Decimal {
        self.total_volume
    }

    pub fn total_orders(&self) -> u64 {
        self.total_orders
    }

    pub fn open_orders(&self) -> usize {
        self.index.len()
    }

    pub fn poisoned(&self) -> bool {
        self.poisoned
    }

    // ── Matching algorithms ─────────────────────────────────────────

    /// LIMIT and ICEBERG: take marketable liquidity, rest the remainder.
    fn match_limit(&mut self, order: &mut Order, now: i64) -> Vec<Trade> {
        let mut trades = Vec::new();
        match order.side {
            Side::Buy => self.sweep_asks(order, order.price, now, &mut trades),
            Side::Sell => self.sweep_bids(order, order.price, now, &mut trades),
        }
        if !order.remaining().is_zero() {
            self.rest(order);
            if !order.has_fills() {
                order.status = OrderStatus::New;
            }
        }
        trades
    }

    /// MARKET: take at any price, never rest. Any unfilled remainder
    /// leaves the order PARTIAL, fills or not.
    fn match_market(&mut self, order: &mut Order, now: i64) -> Vec<Trade> {
        let mut trades = Vec::new();
        match order.side {
            Side::Buy => self.sweep_asks(order, None, now, &mut trades),
            Side::Sell => self.sweep_bids(order, None, now, &mut trades),
        }
        if !order.is_filled() {
            order.status = OrderStatus::Partial;
        }
        trades
    }

    /// IOC: take what is immediately marketable, cancel the rest.
    fn match_ioc(&mut self, order: &mut Order, now: i64) -> Vec<Trade> {
        let mut trades = Vec::new();
        match order.side {
            Side::Buy => self.sweep_asks(order, order.price, now, &mut trades),
            Side::Sell => self.sweep_bids(order, order.price, now, &mut trades),
        }
        if !order.is_filled() {
            order.status = if order.has_fills() {
                OrderStatus::Partial
            } else {
                OrderStatus::Cancelled
            };
        }
        trades
    }

    /// FOK: dry-walk the opposite side first; execute only if the whole
    /// quantity is fillable, otherwise cancel with zero trades.
    fn match_fok(&mut self, order: &mut Order, now: i64) -> Vec<Trade> {
        let available = self.fillable(order.side, order.price, order.remaining());
        if available < order.remaining() {
            order.status = OrderStatus::Cancelled;
            return Vec::new();
        }

        let mut trades = Vec::new();
        match order.side {
            Side::Buy => self.sweep_asks(order, order.price, now, &mut trades),
            Side::Sell => self.sweep_bids(order, order.price, now, &mut trades),
        }
        debug_assert!(order.is_filled(), "FOK dry pass promised a full fill");
        trades
    }

    /// Quantity fillable against the opposite side under a limit,
    /// counting hidden iceberg remainders (they replenish mid-sweep).
    fn fillable(&self, side: Side, limit: Option<Price>, needed: Quantity) -> Quantity {
        let mut available = Quantity::ZERO;
        match side {
            Side::Buy => {
                for (price, level) in self.asks.levels() {
                    if !crossing::marketable(Side::Buy, limit, price) {
                        break;
                    }
                    available += level.total_remaining();
                    if available >= needed {
                        break;
                    }
                }
            }
            Side::Sell => {
                for (price, level) in self.bids.levels() {
                    if !crossing::marketable(Side::Sell, limit, price) {
                        break;
                    }
                    available += level.total_remaining();
                    if available >= needed {
                        break;
                    }
                }
            }
        }
        available
    }

    /// Walk ask levels from the best price, consuming FIFO entries.
    fn sweep_asks(
        &mut self,
        order: &mut Order,
        limit: Option<Price>,
        now: i64,
        trades: &mut Vec<Trade>,
    ) {
        while !order.remaining().is_zero() {
            let Some(level_price) = self.asks.best_price() else {
                break;
            };
            if !crossing::marketable(Side::Buy, limit, level_price) {
                break;
            }

            loop {
                if order.remaining().is_zero() {
                    break;
                }
                let Some(level) = self.asks.level_mut(level_price) else {
                    break;
                };
                let Some((maker_order_id, maker_user_id, maker_visible)) =
                    level.front().map(|f| (f.order_id, f.user_id, f.visible()))
                else {
                    break;
                };

                let quantity = order.remaining().min(maker_visible);
                let trade = self.executor.execute(
                    &self.symbol,
                    order,
                    maker_order_id,
                    maker_user_id,
                    level_price,
                    quantity,
                    now,
                );
                order.add_fill(quantity);
                if let Some(FrontFill::Completed(done)) = level.fill_front(quantity) {
                    self.index.remove(&done.order_id);
                }
                if self.recent_trades.len() >= self.trades_capacity {
                    self.recent_trades.pop_front();
                }
                self.recent_trades.push_back(trade.clone());
                self.total_volume += trade.quantity.as_decimal();
                trades.push(trade);
            }

            self.asks.prune(level_price);
        }
    }

    /// Walk bid levels from the best price, consuming FIFO entries.
    fn sweep_bids(
        &mut self,
        order: &mut Order,
        limit: Option<Price>,
        now: i64,
        trades: &mut Vec<Trade>,
    ) {
        while !order.remaining().is_zero() {
            let Some(level_price) = self.bids.best_price() else {
                break;
            };
            if !crossing::marketable(Side::Sell, limit, level_price) {
                break;
            }

            loop {
                if order.remaining().is_zero() {
                    break;
                }
                let Some(level) = self.bids.level_mut(level_price) else {
                    break;
                };
                let Some((maker_order_id, maker_user_id, maker_visible)) =
                    level.front().map(|f| (f.order_id, f.user_id, f.visible()))
                else {
                    break;
                };

                let quantity = order.remaining().min(maker_visible);
                let trade = self.executor.execute(
                    &self.symbol,
                    order,
                    maker_order_id,
                    maker_user_id,
                    level_price,
                    quantity,
                    now,
                );
                order.add_fill(quantity);
                if let Some(FrontFill::Completed(done)) = level.fill_front(quantity) {
                    self.index.remove(&done.order_id);
                }
                if self.recent_trades.len() >= self.trades_capacity {
                    self.recent_trades.pop_front();
                }
                self.recent_trades.push_back(trade.clone());
                self.total_volume += trade.quantity.as_decimal();
                trades.push(trade);
            }

            self.bids.prune(level_price);
        }
    }

    /// Rest the unfilled remainder at the order's limit price.
    fn rest(&mut self, order: &Order) {
        let price = order.price.expect("resting order requires a limit price");
        let iceberg = match order.kind {
            OrderKind::Iceberg { peak } => Some(IcebergState::new(peak, order.remaining())),
            _ => None,
        };
        let entry = RestingOrder {
            order_id: order.order_id,
            user_id: order.user_id,
            quantity: order.quantity,
            filled: order.filled_quantity,
            iceberg,
            timestamp: order.timestamp,
        };
        match order.side {
            Side::Buy => self.bids.insert(price, entry),
            Side::Sell => self.asks.insert(price, entry),
        }
        self.index.insert(order.order_id, (order.side, price));
    }

    fn level_of(&self, side: Side, price: Price) -> Option<&super::price_level::PriceLevel> {
        match side {
            Side::Buy => self.bids.level(price),
            Side::Sell => self.asks.level(price),
        }
    }

    /// The book must not be crossed once matching completes.
    fn check_uncrossed(&self) -> Result<(), BookError> {
        if let (Some(bid), Some(ask)) = (self.best_bid(), self.best_ask()) {
            if crossing::crossed(bid, ask) {
                return Err(BookError::InvariantViolation {
                    detail: format!(
                        "book crossed after matching: bid {bid} >= ask {ask} on {}",
                        self.symbol
                    ),
                });
            }
        }
        Ok(())
    }

    /// Full structural check: index ↔ level agreement and per-level
    /// visible totals. Intended for tests and debug assertions.
    pub fn validate(&self) -> Result<(), BookError> {
        for (&order_id, &(side, price)) in &self.index {
            let found = self
                .level_of(side, price)
                .and_then(|level| level.get(order_id));
            if found.is_none() {
                return Err(BookError::InvariantViolation {
                    detail: format!("index entry {order_id} missing from level {price}"),
                });
            }
        }

        let check_levels = |levels: Vec<(Price, Quantity, usize)>| -> Result<(), BookError> {
            for (price, cached, _count) in levels {
                let level = self
                    .bids
                    .level(price)
                    .or_else(|| self.asks.level(price))
                    .expect("depth reported a missing level");
                let summed = level
                    .iter()
                    .fold(Quantity::ZERO, |acc, o| acc + o.visible());
                if summed != cached {
                    return Err(BookError::InvariantViolation {
                        detail: format!("level {price} cached {cached}, summed {summed}"),
                    });
                }
            }
            Ok(())
        };
        check_levels(self.bids.depth(usize::MAX))?;
        check_levels(self.asks.depth(usize::MAX))?;

        self.check_uncrossed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> OrderBook {
        OrderBook::new(Symbol::new("AAPL"), 100)
    }

    fn order(id: u64, side: Side, kind: OrderKind, price: Option<u64>, qty: u64) -> Order {
        Order::new(
            OrderId::new(id),
            UserId::new(id),
            Symbol::new("AAPL"),
            side,
            kind,
            price.map(Price::from_u64),
            Quantity::from_u64(qty),
            id as i64,
        )
    }

    fn limit(id: u64, side: Side, price: u64, qty: u64) -> Order {
        order(id, side, OrderKind::Limit, Some(price), qty)
    }

    #[test]
    fn test_limit_rests_when_not_marketable() {
        let mut book = book();
        let mut buy = limit(1, Side::Buy, 10, 100);
        let trades = book.submit(&mut buy, 1).unwrap();

        assert!(trades.is_empty());
        assert_eq!(buy.status, OrderStatus::New);
        assert_eq!(book.best_bid(), Some(Price::from_u64(10)));
        assert!(book.contains(OrderId::new(1)));
        book.validate().unwrap();
    }

    #[test]
    fn test_exact_cross_fills_both() {
        let mut book = book();
        book.submit(&mut limit(1, Side::Buy, 10, 100), 1).unwrap();

        let mut sell = limit(2, Side::Sell, 10, 100);
        let trades = book.submit(&mut sell, 2).unwrap();

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].quantity, Quantity::from_u64(100));
        assert_eq!(trades[0].price, Price::from_u64(10));
        assert_eq!(sell.status, OrderStatus::Filled);
        assert!(book.best_bid().is_none());
        assert!(book.best_ask().is_none());
        book.validate().unwrap();
    }

    #[test]
    fn test_maker_price_rule() {
        let mut book = book();
        book.submit(&mut limit(1, Side::Sell, 10, 50), 1).unwrap();

        // Aggressive buy at 12 executes at the resting price 10.
        let mut buy = limit(2, Side::Buy, 12, 50);
        let trades = book.submit(&mut buy, 2).unwrap();
        assert_eq!(trades[0].price, Price::from_u64(10));
    }

    #[test]
    fn test_fifo_within_price_level() {
        let mut book = book();
        book.submit(&mut limit(1, Side::Sell, 10, 30), 1).unwrap();
        book.submit(&mut limit(2, Side::Sell, 10, 30), 2).unwrap();

        let mut buy = limit(3, Side::Buy, 10, 30);
        let trades = book.submit(&mut buy, 3).unwrap();
        assert_eq!(trades[0].sell_order_id, OrderId::new(1));
        assert!(book.contains(OrderId::new(2)));
    }

    #[test]
    fn test_price_priority_across_levels() {
        let mut book = book();
        book.submit(&mut limit(1, Side::Sell, 11, 50), 1).unwrap();
        book.submit(&mut limit(2, Side::Sell, 10, 50), 2).unwrap();

        let mut buy = limit(3, Side::Buy, 11, 80);
        let trades = book.submit(&mut buy, 3).unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].price, Price::from_u64(10));
        assert_eq!(trades[1].price, Price::from_u64(11));
        assert_eq!(buy.status, OrderStatus::Filled);
    }

    #[test]
    fn test_partial_fill_rests_remainder() {
        let mut book = book();
        book.submit(&mut limit(1, Side::Sell, 10, 40), 1).unwrap();

        let mut buy = limit(2, Side::Buy, 10, 100);
        let trades = book.submit(&mut buy, 2).unwrap();

        assert_eq!(trades.len(), 1);
        assert_eq!(buy.status, OrderStatus::Partial);
        assert_eq!(buy.remaining(), Quantity::from_u64(60));
        assert_eq!(book.best_bid(), Some(Price::from_u64(10)));
        book.validate().unwrap();
    }

    #[test]
    fn test_market_sweeps_multiple_levels() {
        let mut book = book();
        book.submit(&mut limit(1, Side::Sell, 10, 50), 1).unwrap();
        book.submit(&mut limit(2, Side::Sell, 11, 50), 2).unwrap();

        let mut buy = order(3, Side::Buy, OrderKind::Market, None, 80);
        let trades = book.submit(&mut buy, 3).unwrap();

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].quantity, Quantity::from_u64(50));
        assert_eq!(trades[0].price, Price::from_u64(10));
        assert_eq!(trades[1].quantity, Quantity::from_u64(30));
        assert_eq!(trades[1].price, Price::from_u64(11));
        assert_eq!(buy.status, OrderStatus::Filled);

        // 20 remain at 11.
        let depth = book.depth(5);
        assert_eq!(depth.asks.len(), 1);
        assert_eq!(depth.asks[0].quantity, Quantity::from_u64(20));
    }

    #[test]
    fn test_market_on_empty_book() {
        let mut book = book();
        let mut buy = order(1, Side::Buy, OrderKind::Market, None, 10);
        let trades = book.submit(&mut buy, 1).unwrap();

        assert!(trades.is_empty());
        assert_eq!(buy.status, OrderStatus::Partial);
        assert!(!book.contains(OrderId::new(1)));
    }

    #[test]
    fn test_market_residual_never_rests() {
        let mut book = book();
        book.submit(&mut limit(1, Side::Sell, 10, 30), 1).unwrap();

        let mut buy = order(2, Side::Buy, OrderKind::Market, None, 100);
        let trades = book.submit(&mut buy, 2).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(buy.status, OrderStatus::Partial);
        assert!(!book.contains(OrderId::new(2)));
        assert!(book.best_bid().is_none());
    }

    #[test]
    fn test_ioc_partial_then_cancelled() {
        let mut book = book();
        book.submit(&mut limit(1, Side::Sell, 10, 100), 1).unwrap();

        let mut buy = order(2, Side::Buy, OrderKind::Ioc, Some(10), 40);
        let trades = book.submit(&mut buy, 2).unwrap();

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].quantity, Quantity::from_u64(40));
        assert_eq!(buy.status, OrderStatus::Filled);
        assert!(!book.contains(OrderId::new(2)));

        let depth = book.depth(1);
        assert_eq!(depth.asks[0].quantity, Quantity::from_u64(60));
    }

    #[test]
    fn test_ioc_unmarketable_cancels() {
        let mut book = book();
        book.submit(&mut limit(1, Side::Sell, 12, 100), 1).unwrap();

        let mut buy = order(2, Side::Buy, OrderKind::Ioc, Some(10), 40);
        let trades = book.submit(&mut buy, 2).unwrap();
        assert!(trades.is_empty());
        assert_eq!(buy.status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_fok_rejects_when_underfilled() {
        let mut book = book();
        book.submit(&mut limit(1, Side::Sell, 10, 100), 1).unwrap();

        let mut buy = order(2, Side::Buy, OrderKind::Fok, Some(10), 150);
        let trades = book.submit(&mut buy, 2).unwrap();

        assert!(trades.is_empty());
        assert_eq!(buy.status, OrderStatus::Cancelled);
        // Resting ask untouched.
        let depth = book.depth(1);
        assert_eq!(depth.asks[0].quantity, Quantity::from_u64(100));
    }

    #[test]
    fn test_fok_executes_fully_when_fillable() {
        let mut book = book();
        book.submit(&mut limit(1, Side::Sell, 10, 100), 1).unwrap();
        book.submit(&mut limit(2, Side::Sell, 11, 100), 2).unwrap();

        let mut buy = order(3, Side::Buy, OrderKind::Fok, Some(11), 150);
        let trades = book.submit(&mut buy, 3).unwrap();

        assert_eq!(trades.len(), 2);
        assert_eq!(buy.status, OrderStatus::Filled);
        assert!(!book.contains(OrderId::new(3)));
    }

    #[test]
    fn test_fok_counts_hidden_iceberg_quantity() {
        let mut book = book();
        let mut iceberg = order(
            1,
            Side::Sell,
            OrderKind::Iceberg { peak: Quantity::from_u64(10) },
            Some(10),
            500,
        );
        book.submit(&mut iceberg, 1).unwrap();

        // Visible is only 10, but 500 is fillable through replenishment.
        let mut buy = order(2, Side::Buy, OrderKind::Fok, Some(10), 400);
        let trades = book.submit(&mut buy, 2).unwrap();
        assert!(!trades.is_empty());
        assert_eq!(buy.status, OrderStatus::Filled);
    }

    #[test]
    fn test_iceberg_depth_shows_peak_only() {
        let mut book = book();
        let mut iceberg = order(
            1,
            Side::Sell,
            OrderKind::Iceberg { peak: Quantity::from_u64(100) },
            Some(10),
            1000,
        );
        book.submit(&mut iceberg, 1).unwrap();

        let depth = book.depth(1);
        assert_eq!(depth.asks[0].quantity, Quantity::from_u64(100));
        book.validate().unwrap();
    }

    #[test]
    fn test_iceberg_replenishes_after_fill() {
        let mut book = book();
        let mut iceberg = order(
            1,
            Side::Sell,
            OrderKind::Iceberg { peak: Quantity::from_u64(100) },
            Some(10),
            1000,
        );
        book.submit(&mut iceberg, 1).unwrap();

        let mut buy = limit(2, Side::Buy, 10, 100);
        let trades = book.submit(&mut buy, 2).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].quantity, Quantity::from_u64(100));

        // Depth still shows a fresh 100 tranche; 800 hidden.
        let depth = book.depth(1);
        assert_eq!(depth.asks[0].quantity, Quantity::from_u64(100));
        book.validate().unwrap();
    }

    #[test]
    fn test_iceberg_aggressor_chews_through_tranches() {
        let mut book = book();
        let mut iceberg = order(
            1,
            Side::Sell,
            OrderKind::Iceberg { peak: Quantity::from_u64(100) },
            Some(10),
            250,
        );
        book.submit(&mut iceberg, 1).unwrap();

        let mut buy = limit(2, Side::Buy, 10, 250);
        let trades = book.submit(&mut buy, 2).unwrap();
        // 100 + 100 + 50, one trade per tranche.
        assert_eq!(trades.len(), 3);
        assert_eq!(buy.status, OrderStatus::Filled);
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn test_cancel_then_cancel_again() {
        let mut book = book();
        book.submit(&mut limit(1, Side::Buy, 10, 100), 1).unwrap();

        assert!(book.cancel(OrderId::new(1)));
        assert!(!book.cancel(OrderId::new(1)));
        assert!(book.best_bid().is_none());
    }

    #[test]
    fn test_cancel_unknown_order() {
        let mut book = book();
        assert!(!book.cancel(OrderId::new(99)));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut book = book();
        book.submit(&mut limit(1, Side::Buy, 10, 100), 1).unwrap();

        let mut dup = limit(1, Side::Buy, 11, 100);
        let err = book.submit(&mut dup, 2).unwrap_err();
        assert_eq!(err, BookError::DuplicateOrderId(OrderId::new(1)));
    }

    #[test]
    fn test_modify_decrease_preserves_priority() {
        let mut book = book();
        book.submit(&mut limit(1, Side::Sell, 10, 100), 1).unwrap();
        book.submit(&mut limit(2, Side::Sell, 10, 100), 2).unwrap();

        let result = book.modify(OrderId::new(1), Quantity::from_u64(50), None, 3);
        assert!(result.modified);
        assert!(result.trades.is_empty());

        // Order 1 still fills first.
        let mut buy = limit(3, Side::Buy, 10, 10);
        let trades = book.submit(&mut buy, 4).unwrap();
        assert_eq!(trades[0].sell_order_id, OrderId::new(1));
    }

    #[test]
    fn test_modify_increase_forfeits_priority() {
        let mut book = book();
        book.submit(&mut limit(1, Side::Sell, 10, 100), 1).unwrap();
        book.submit(&mut limit(2, Side::Sell, 10, 100), 2).unwrap();

        let result = book.modify(OrderId::new(1), Quantity::from_u64(200), None, 3);
        assert!(result.modified);

        let mut buy = limit(3, Side::Buy, 10, 10);
        let trades = book.submit(&mut buy, 4).unwrap();
        assert_eq!(trades[0].sell_order_id, OrderId::new(2));
        book.validate().unwrap();
    }

    #[test]
    fn test_modify_price_change_rematches() {
        let mut book = book();
        book.submit(&mut limit(1, Side::Buy, 9, 50), 1).unwrap();
        book.submit(&mut limit(2, Side::Sell, 11, 50), 2).unwrap();

        // Repricing the bid to 11 crosses the resting ask.
        let result = book.modify(
            OrderId::new(1),
            Quantity::from_u64(50),
            Some(Price::from_u64(11)),
            3,
        );
        assert!(result.modified);
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].price, Price::from_u64(11));
        assert!(book.best_bid().is_none());
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn test_modify_unknown_returns_false() {
        let mut book = book();
        let result = book.modify(OrderId::new(42), Quantity::from_u64(1), None, 1);
        assert!(!result.modified);
    }

    #[test]
    fn test_spread() {
        let mut book = book();
        assert!(book.spread().is_none());
        book.submit(&mut limit(1, Side::Buy, 9, 10), 1).unwrap();
        book.submit(&mut limit(2, Side::Sell, 11, 10), 2).unwrap();
        assert_eq!(book.spread(), Some(Decimal::from(2)));
    }

    #[test]
    fn test_recent_trades_newest_first() {
        let mut book = book();
        book.submit(&mut limit(1, Side::Sell, 10, 30), 1).unwrap();
        book.submit(&mut limit(2, Side::Sell, 11, 30), 2).unwrap();
        let mut buy = limit(3, Side::Buy, 11, 60);
        book.submit(&mut buy, 3).unwrap();

        let recent = book.recent_trades(10);
        assert_eq!(recent.len(), 2);
        assert!(recent[0].trade_id > recent[1].trade_id);
    }

    #[test]
    fn test_self_match_permitted() {
        let mut book = book();
        let user = UserId::new(7);
        let mut sell = limit(1, Side::Sell, 10, 50);
        sell.user_id = user;
        book.submit(&mut sell, 1).unwrap();

        let mut buy = limit(2, Side::Buy, 10, 50);
        buy.user_id = user;
        let trades = book.submit(&mut buy, 2).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].buy_user_id, trades[0].sell_user_id);
    }

    #[test]
    fn test_totals_and_open_orders() {
        let mut book = book();
        book.submit(&mut limit(1, Side::Sell, 10, 30), 1).unwrap();
        let mut buy = limit(2, Side::Buy, 10, 30);
        book.submit(&mut buy, 2).unwrap();

        assert_eq!(book.total_orders(), 2);
        assert_eq!(book.total_volume(), Decimal::from(30));
        assert_eq!(book.open_orders(), 0);
    }

    #[test]
    fn test_book_order_views() {
        let mut book = book();
        book.submit(&mut limit(1, Side::Sell, 11, 10), 1).unwrap();
        book.submit(&mut limit(2, Side::Sell, 12, 10), 2).unwrap();
        book.submit(&mut limit(3, Side::Buy, 9, 10), 3).unwrap();
        book.submit(&mut limit(4, Side::Buy, 8, 10), 4).unwrap();

        let asks = book.ask_orders();
        assert_eq!(asks[0].price, Price::from_u64(11));
        assert_eq!(asks[1].price, Price::from_u64(12));

        let bids = book.bid_orders();
        assert_eq!(bids[0].price, Price::from_u64(9));
        assert_eq!(bids[1].price, Price::from_u64(8));
    }

    #[test]
    fn test_conservation_of_quantity() {
        let mut book = book();
        book.submit(&mut limit(1, Side::Sell, 10, 35), 1).unwrap();
        book.submit(&mut limit(2, Side::Sell, 11, 35), 2).unwrap();

        let mut buy = limit(3, Side::Buy, 11, 100);
        let trades = book.submit(&mut buy, 3).unwrap();

        let traded = trades
            .iter()
            .fold(Quantity::ZERO, |acc, t| acc + t.quantity);
        assert_eq!(traded + buy.remaining(), buy.quantity);
        book.validate().unwrap();
    }
}
