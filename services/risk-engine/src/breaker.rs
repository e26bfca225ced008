//! Circuit breaker
//!
//! Per-symbol anomaly detection over bounded histories: price moves
//! against a reference, annualised volatility of recent returns, volume
//! spikes over the rolling mean, and order-arrival rate in a trailing
//! one-second window. Any trip halts the symbol until an explicit
//! resume. A market-wide halt overrides everything.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{info, warn};

use types::ids::Symbol;
use types::numeric::{Price, Quantity};
use types::risk::BreakerLimits;

const NANOS_PER_SECOND: i64 = 1_000_000_000;
/// Trading days per year, for annualising volatility.
const TRADING_DAYS: f64 = 252.0;

/// Point-in-time view of a symbol's breaker inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketStats {
    pub price_change_pct: Decimal,
    pub volatility: Decimal,
    pub last_volume: Decimal,
    pub order_rate: usize,
    pub halted: bool,
    pub halt_reason: Option<String>,
}

#[derive(Debug, Default)]
struct SymbolState {
    price_history: VecDeque<Decimal>,
    volume_history: VecDeque<Decimal>,
    order_times: VecDeque<i64>,
    reference_price: Option<Decimal>,
    last_price_change: Decimal,
    halted: bool,
    halt_reason: Option<String>,
    halt_time: Option<i64>,
}

/// Per-symbol circuit breaker with a market-wide override.
pub struct CircuitBreaker {
    limits: BreakerLimits,
    symbols: DashMap<Symbol, SymbolState>,
    market_halted: AtomicBool,
    market_halt_reason: Mutex<Option<String>>,
}

impl CircuitBreaker {
    pub fn new(limits: BreakerLimits) -> Self {
        Self {
            limits,
            symbols: DashMap::new(),
            market_halted: AtomicBool::new(false),
            market_halt_reason: Mutex::new(None),
        }
    }

    /// Feed one trade print. Returns the halt reason if a limit
    /// tripped; the triggering trade itself stands.
    pub fn on_trade(
        &self,
        symbol: &Symbol,
        price: Price,
        volume: Quantity,
        now: i64,
    ) -> Option<String> {
        let mut state = self.symbols.entry(symbol.clone()).or_default();
        let price = price.as_decimal();

        // Price move against the reference.
        let reference = state.reference_price;
        if let Some(reference) = reference {
            if !reference.is_zero() {
                let change = (price - reference) / reference;
                state.last_price_change = change;
                if change.abs() > self.limits.max_price_move_pct {
                    let reason = format!(
                        "price moved {:.2}% from reference {reference}",
                        change * Decimal::from(100)
                    );
                    Self::halt_state(&mut state, symbol, &reason, now);
                    return Some(reason);
                }
            }
        }
        state.reference_price = Some(price);

        push_bounded(&mut state.price_history, price, self.limits.price_history_len);

        // Annualised volatility of recent returns.
        let volatility = annualised_volatility(&state.price_history);
        if let Some(max) = self.limits.max_volatility.to_f64() {
            if volatility > max {
                let reason = format!("volatility {:.1}% exceeded limit", volatility * 100.0);
                Self::halt_state(&mut state, symbol, &reason, now);
                return Some(reason);
            }
        }

        // Volume spike over the rolling mean.
        let volume = volume.as_decimal();
        let spike = volume_spike(&state.volume_history, volume);
        push_bounded(&mut state.volume_history, volume, self.limits.volume_history_len);
        if spike > self.limits.max_volume_spike {
            let reason = format!("volume spike {spike} exceeded limit");
            Self::halt_state(&mut state, symbol, &reason, now);
            return Some(reason);
        }

        None
    }

    /// Record an order arrival and check the trailing-1s rate. Returns
    /// the halt reason if the rate limit tripped.
    pub fn record_order(&self, symbol: &Symbol, now: i64) -> Option<String> {
        let mut state = self.symbols.entry(symbol.clone()).or_default();
        state.order_times.push_back(now);

        let cutoff = now - NANOS_PER_SECOND;
        while state.order_times.front().is_some_and(|&t| t < cutoff) {
            state.order_times.pop_front();
        }

        if state.order_times.len() > self.limits.max_order_rate {
            let reason = format!(
                "order rate {} exceeded {}/s",
                state.order_times.len(),
                self.limits.max_order_rate
            );
            Self::halt_state(&mut state, symbol, &reason, now);
            return Some(reason);
        }
        None
    }

    pub fn is_symbol_halted(&self, symbol: &Symbol) -> bool {
        self.symbols.get(symbol).is_some_and(|s| s.halted)
    }

    pub fn halt_reason(&self, symbol: &Symbol) -> Option<String> {
        self.symbols.get(symbol).and_then(|s| s.halt_reason.clone())
    }

    pub fn halt_symbol(&self, symbol: &Symbol, reason: &str, now: i64) {
        let mut state = self.symbols.entry(symbol.clone()).or_default();
        Self::halt_state(&mut state, symbol, reason, now);
    }

    pub fn resume_symbol(&self, symbol: &Symbol) {
        if let Some(mut state) = self.symbols.get_mut(symbol) {
            state.halted = false;
            state.halt_reason = None;
            state.halt_time = None;
            info!(%symbol, "trading resumed");
        }
    }

    pub fn halt_market(&self, reason: &str) {
        self.market_halted.store(true, Ordering::SeqCst);
        *self.market_halt_reason.lock() = Some(reason.to_string());
        warn!(reason, "market-wide halt");
    }

    pub fn resume_market(&self) {
        self.market_halted.store(false, Ordering::SeqCst);
        *self.market_halt_reason.lock() = None;
        info!("market-wide halt lifted");
    }

    pub fn is_market_halted(&self) -> bool {
        self.market_halted.load(Ordering::SeqCst)
    }

    pub fn market_halt_reason(&self) -> Option<String> {
        self.market_halt_reason.lock().clone()
    }

    pub fn market_stats(&self, symbol: &Symbol) -> Option<MarketStats> {
        let state = self.symbols.get(symbol)?;
        Some(MarketStats {
            price_change_pct: state.last_price_change,
            volatility: Decimal::from_f64_retain(annualised_volatility(&state.price_history))
                .unwrap_or_default(),
            last_volume: state.volume_history.back().copied().unwrap_or_default(),
            order_rate: state.order_times.len(),
            halted: state.halted,
            halt_reason: state.halt_reason.clone(),
        })
    }

    fn halt_state(state: &mut SymbolState, symbol: &Symbol, reason: &str, now: i64) {
        state.halted = true;
        state.halt_reason = Some(reason.to_string());
        state.halt_time = Some(now);
        warn!(%symbol, reason, "symbol halted");
    }
}

fn push_bounded(history: &mut VecDeque<Decimal>, value: Decimal, cap: usize) {
    if history.len() >= cap {
        history.pop_front();
    }
    history.push_back(value);
}

/// Standard deviation of period returns, scaled by √252.
fn annualised_volatility(prices: &VecDeque<Decimal>) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }
    let prices: Vec<f64> = prices.iter().filter_map(|p| p.to_f64()).collect();
    let returns: Vec<f64> = prices
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();
    if returns.is_empty() {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance =
        returns.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / returns.len() as f64;
    variance.sqrt() * TRADING_DAYS.sqrt()
}

/// Current volume minus the mean of recent volumes. Without a
/// baseline yet, the whole current volume counts as the spike.
fn volume_spike(history: &VecDeque<Decimal>, current: Decimal) -> Decimal {
    if history.len() < 2 {
        return current;
    }
    let mean = history.iter().sum::<Decimal>() / Decimal::from(history.len());
    current - mean
}
