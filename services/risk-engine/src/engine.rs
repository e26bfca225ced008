//! Risk engine facade
//!
//! Ties the circuit breaker, the limit checks, and the position book
//! together behind the two calls the matching engine makes: a
//! pre-trade gate per order and a post-trade record per fill.

use rust_decimal::Decimal;

use types::config::RiskConfig;
use types::ids::{Symbol, UserId};
use types::numeric::Price;
use types::order::{Order, OrderKind};
use types::position::Position;
use types::risk::{BreakerLimits, RiskCheckResult, RiskLimits};
use types::trade::Trade;

use crate::breaker::{CircuitBreaker, MarketStats};
use crate::events::{RiskEvent, RiskEventKind};
use crate::gate;
use crate::positions::PositionBook;

/// Pre-trade gate, circuit breaker, and position keeping.
pub struct RiskEngine {
    breaker: CircuitBreaker,
    positions: PositionBook,
}

impl RiskEngine {
    pub fn new(config: &RiskConfig, breaker_limits: BreakerLimits) -> Self {
        Self {
            breaker: CircuitBreaker::new(breaker_limits),
            positions: PositionBook::new(config.default_limits.clone(), config.starting_equity),
        }
    }

    /// Evaluate every check against an incoming order. First failure
    /// wins; a failure also yields an event for the status feed.
    ///
    /// Check order: circuit breaker (market, symbol, order rate), order
    /// size, position, notional, daily volume, drawdown, and price
    /// deviation for MARKET orders.
    pub fn check_order(&self, order: &Order, now: i64) -> (RiskCheckResult, Vec<RiskEvent>) {
        let mut events = Vec::new();

        if self.breaker.is_market_halted() {
            let reason = self
                .breaker
                .market_halt_reason()
                .unwrap_or_else(|| "market halted".to_string());
            let result = RiskCheckResult::Halted {
                symbol: None,
                reason,
            };
            events.push(self.check_failed_event(order.user_id, &result, now));
            return (result, events);
        }

        if self.breaker.is_symbol_halted(&order.symbol) {
            let reason = self
                .breaker
                .halt_reason(&order.symbol)
                .unwrap_or_else(|| "symbol halted".to_string());
            let result = RiskCheckResult::Halted {
                symbol: Some(order.symbol.clone()),
                reason,
            };
            events.push(self.check_failed_event(order.user_id, &result, now));
            return (result, events);
        }

        // Arrival counts toward the rate window even if a later check
        // rejects the order.
        if let Some(reason) = self.breaker.record_order(&order.symbol, now) {
            events.push(RiskEvent::new(
                RiskEventKind::SymbolHalted {
                    symbol: order.symbol.clone(),
                    reason: reason.clone(),
                },
                now,
            ));
            let result = RiskCheckResult::Halted {
                symbol: Some(order.symbol.clone()),
                reason,
            };
            events.push(self.check_failed_event(order.user_id, &result, now));
            return (result, events);
        }

        let limits = self.positions.limits_for(order.user_id);
        let market_price = self.positions.market_price(&order.symbol);

        let result = self.run_gate(order, &limits, market_price);
        if !result.is_pass() {
            events.push(self.check_failed_event(order.user_id, &result, now));
        }
        (result, events)
    }

    fn run_gate(
        &self,
        order: &Order,
        limits: &RiskLimits,
        market_price: Option<Price>,
    ) -> RiskCheckResult {
        let result = gate::check_order_size(order.quantity, limits);
        if !result.is_pass() {
            return result;
        }

        let net = self.positions.net_position(order.user_id, &order.symbol);
        let result = gate::check_position(net, order.side, order.quantity, limits);
        if !result.is_pass() {
            return result;
        }

        let effective_price = order.price.or(market_price);
        let daily_notional = self.positions.daily_notional(order.user_id);
        let result = gate::check_notional(effective_price, order.quantity, daily_notional, limits);
        if !result.is_pass() {
            return result;
        }

        let daily_volume = self.positions.daily_volume(order.user_id);
        let result = gate::check_daily_volume(daily_volume, order.quantity, limits);
        if !result.is_pass() {
            return result;
        }

        let equity = self.positions.equity(order.user_id);
        let result = gate::check_drawdown(equity, self.positions.starting_equity(), limits);
        if !result.is_pass() {
            return result;
        }

        if matches!(order.kind, OrderKind::Market) {
            let reference = self.positions.market_price(&order.symbol);
            let result = gate::check_price_deviation(market_price, reference, limits);
            if !result.is_pass() {
                return result;
            }
        }

        RiskCheckResult::Pass
    }

    /// Record an executed trade: update both counterparties' positions
    /// and feed the breaker's price/volume histories. A breaker trip
    /// here halts the symbol for subsequent orders.
    pub fn record_trade(&self, trade: &Trade, now: i64) -> Vec<RiskEvent> {
        self.positions.record_trade(trade);

        let mut events = Vec::new();
        if let Some(reason) = self
            .breaker
            .on_trade(&trade.symbol, trade.price, trade.quantity, now)
        {
            events.push(RiskEvent::new(
                RiskEventKind::SymbolHalted {
                    symbol: trade.symbol.clone(),
                    reason,
                },
                now,
            ));
        }
        events
    }

    /// Refresh the marked price for a symbol (typically from best bid).
    pub fn update_market_price(&self, symbol: &Symbol, price: Price) {
        self.positions.update_market_price(symbol, price);
    }

    pub fn is_halted(&self, symbol: &Symbol) -> bool {
        self.breaker.is_market_halted() || self.breaker.is_symbol_halted(symbol)
    }

    pub fn halt_symbol(&self, symbol: &Symbol, reason: &str, now: i64) -> RiskEvent {
        self.breaker.halt_symbol(symbol, reason, now);
        RiskEvent::new(
            RiskEventKind::SymbolHalted {
                symbol: symbol.clone(),
                reason: reason.to_string(),
            },
            now,
        )
    }

    pub fn resume_symbol(&self, symbol: &Symbol, now: i64) -> RiskEvent {
        self.breaker.resume_symbol(symbol);
        RiskEvent::new(
            RiskEventKind::SymbolResumed {
                symbol: symbol.clone(),
            },
            now,
        )
    }

    pub fn halt_market(&self, reason: &str, now: i64) -> RiskEvent {
        self.breaker.halt_market(reason);
        RiskEvent::new(
            RiskEventKind::MarketHalted {
                reason: reason.to_string(),
            },
            now,
        )
    }

    pub fn resume_market(&self, now: i64) -> RiskEvent {
        self.breaker.resume_market();
        RiskEvent::new(RiskEventKind::MarketResumed, now)
    }

    pub fn position(&self, user_id: UserId, symbol: &Symbol) -> Option<Position> {
        self.positions.position(user_id, symbol)
    }

    pub fn positions_of(&self, user_id: UserId) -> Vec<Position> {
        self.positions.positions_of(user_id)
    }

    pub fn all_positions(&self) -> Vec<Position> {
        self.positions.all_positions()
    }

    pub fn equity(&self, user_id: UserId) -> Decimal {
        self.positions.equity(user_id)
    }

    pub fn set_user_limits(&self, user_id: UserId, limits: RiskLimits) {
        self.positions.set_limits(user_id, limits);
    }

    pub fn market_stats(&self, symbol: &Symbol) -> Option<MarketStats> {
        self.breaker.market_stats(symbol)
    }

    pub fn reset_daily_counters(&self) {
        self.positions.reset_daily_counters();
    }

    fn check_failed_event(&self, user_id: UserId, result: &RiskCheckResult, now: i64) -> RiskEvent {
        RiskEvent::new(
            RiskEventKind::CheckFailed {
                user_id,
                check: result.check_name().to_string(),
                reason: result.reason(),
            },
            now,
        )
    }
}
