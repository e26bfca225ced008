//! Risk Engine Service
//!
//! Pre-trade gating and post-trade accounting for the matching engine:
//! - per-user limit checks (order size, position, notional, daily
//!   volume, drawdown, price deviation)
//! - per-symbol circuit breaker (price move, volatility, volume spike,
//!   order rate) with market-wide halt
//! - position keeping with real counterparty user ids

pub mod breaker;
pub mod engine;
pub mod events;
pub mod gate;
pub mod positions;

pub use breaker::CircuitBreaker;
pub use engine::RiskEngine;
pub use events::{RiskEvent, RiskEventKind};
