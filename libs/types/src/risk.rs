//! Risk check results and limit configuration
//!
//! Every denial variant carries the configured limit so callers can
//! surface an actionable suggestion with the rejection.

use crate::ids::Symbol;
use crate::numeric::{Price, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of the pre-trade risk gate. First failing check wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RiskCheckResult {
    /// All checks passed.
    Pass,
    /// Symbol or market-wide circuit breaker is active.
    Halted { symbol: Option<Symbol>, reason: String },
    /// Order quantity exceeds the per-user maximum order size.
    OrderSizeExceeded { limit: Quantity, requested: Quantity },
    /// Projected net position would leave the allowed band.
    PositionLimitExceeded { limit: Decimal, projected: Decimal },
    /// Order notional exceeds the per-user cap.
    NotionalExceeded { limit: Decimal, requested: Decimal },
    /// Running daily volume plus this order exceeds the cap.
    DailyVolumeExceeded { limit: Decimal, projected: Decimal },
    /// Equity has fallen below the drawdown floor.
    DrawdownExceeded { limit: Decimal, current: Decimal },
    /// MARKET order too far from the reference price (or no reference).
    PriceDeviationExceeded {
        reference: Option<Price>,
        limit_pct: Decimal,
    },
}

impl RiskCheckResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, RiskCheckResult::Pass)
    }

    /// Short name of the check that produced this result.
    pub fn check_name(&self) -> &'static str {
        match self {
            RiskCheckResult::Pass => "pass",
            RiskCheckResult::Halted { .. } => "circuit_breaker",
            RiskCheckResult::OrderSizeExceeded { .. } => "order_size",
            RiskCheckResult::PositionLimitExceeded { .. } => "position_limit",
            RiskCheckResult::NotionalExceeded { .. } => "notional_limit",
            RiskCheckResult::DailyVolumeExceeded { .. } => "daily_volume",
            RiskCheckResult::DrawdownExceeded { .. } => "drawdown",
            RiskCheckResult::PriceDeviationExceeded { .. } => "price_deviation",
        }
    }

    /// The configured limit to suggest to the submitter, if one applies.
    pub fn suggested_limit(&self) -> Option<Decimal> {
        match self {
            RiskCheckResult::OrderSizeExceeded { limit, .. } => Some(limit.as_decimal()),
            RiskCheckResult::PositionLimitExceeded { limit, .. }
            | RiskCheckResult::NotionalExceeded { limit, .. }
            | RiskCheckResult::DailyVolumeExceeded { limit, .. }
            | RiskCheckResult::DrawdownExceeded { limit, .. } => Some(*limit),
            RiskCheckResult::PriceDeviationExceeded { limit_pct, .. } => Some(*limit_pct),
            _ => None,
        }
    }

    /// Human-readable rejection reason.
    pub fn reason(&self) -> String {
        match self {
            RiskCheckResult::Pass => "approved".to_string(),
            RiskCheckResult::Halted { symbol, reason } => match symbol {
                Some(s) => format!("trading halted on {s}: {reason}"),
                None => format!("market-wide halt: {reason}"),
            },
            RiskCheckResult::OrderSizeExceeded { limit, requested } => {
                format!("order size {requested} exceeds limit {limit}")
            }
            RiskCheckResult::PositionLimitExceeded { limit, projected } => {
                format!("projected position {projected} exceeds limit {limit}")
            }
            RiskCheckResult::NotionalExceeded { limit, requested } => {
                format!("notional {requested} exceeds limit {limit}")
            }
            RiskCheckResult::DailyVolumeExceeded { limit, projected } => {
                format!("daily volume {projected} would exceed limit {limit}")
            }
            RiskCheckResult::DrawdownExceeded { limit, current } => {
                format!("equity ratio {current} below drawdown floor {limit}")
            }
            RiskCheckResult::PriceDeviationExceeded { reference, limit_pct } => match reference {
                Some(r) => format!("price deviates more than {limit_pct} from reference {r}"),
                None => "no reference price for market order".to_string(),
            },
        }
    }
}

/// Per-user risk caps. Applied by the gate in check order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLimits {
    pub max_order_size: Quantity,
    /// Absolute bound on signed net position.
    pub max_position: Decimal,
    /// Cap on a single order's price × quantity.
    pub max_notional: Decimal,
    pub daily_volume_limit: Decimal,
    /// Optional cap on running daily notional.
    #[serde(default)]
    pub daily_notional_limit: Option<Decimal>,
    /// Maximum fractional equity loss before new orders are refused.
    pub max_drawdown: Decimal,
    /// Maximum fractional distance from the reference price for MARKET
    /// orders. `None` disables the check.
    #[serde(default)]
    pub max_price_deviation_pct: Option<Decimal>,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_order_size: Quantity::from_u64(100_000),
            max_position: Decimal::from(1_000_000),
            max_notional: Decimal::from(10_000_000),
            daily_volume_limit: Decimal::from(1_000_000),
            daily_notional_limit: None,
            max_drawdown: Decimal::new(25, 2), // 0.25
            max_price_deviation_pct: None,
        }
    }
}

/// Circuit-breaker thresholds, per symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakerLimits {
    /// Fractional price move from reference that trips a halt.
    pub max_price_move_pct: Decimal,
    /// Annualised volatility ceiling.
    pub max_volatility: Decimal,
    /// Absolute excess over mean recent volume that trips a halt.
    pub max_volume_spike: Decimal,
    /// Orders per trailing second.
    pub max_order_rate: usize,
    pub price_history_len: usize,
    pub volume_history_len: usize,
}

impl Default for BreakerLimits {
    fn default() -> Self {
        Self {
            max_price_move_pct: Decimal::new(10, 2), // 0.10
            max_volatility: Decimal::new(50, 2),     // 0.50
            max_volume_spike: Decimal::from(1_000_000),
            max_order_rate: 1_000,
            price_history_len: 100,
            volume_history_len: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_has_no_suggestion() {
        assert!(RiskCheckResult::Pass.is_pass());
        assert!(RiskCheckResult::Pass.suggested_limit().is_none());
    }

    #[test]
    fn test_order_size_result() {
        let result = RiskCheckResult::OrderSizeExceeded {
            limit: Quantity::from_u64(500),
            requested: Quantity::from_u64(600),
        };
        assert!(!result.is_pass());
        assert_eq!(result.check_name(), "order_size");
        assert_eq!(result.suggested_limit(), Some(Decimal::from(500)));
        assert!(result.reason().contains("600"));
        assert!(result.reason().contains("500"));
    }

    #[test]
    fn test_halted_reason_mentions_symbol() {
        let result = RiskCheckResult::Halted {
            symbol: Some(Symbol::new("AAPL")),
            reason: "price move".to_string(),
        };
        assert!(result.reason().contains("AAPL"));
    }

    #[test]
    fn test_default_breaker_limits() {
        let limits = BreakerLimits::default();
        assert_eq!(limits.max_price_move_pct, Decimal::new(10, 2));
        assert_eq!(limits.max_volatility, Decimal::new(50, 2));
        assert_eq!(limits.max_order_rate, 1_000);
    }

    #[test]
    fn test_risk_limits_serde_roundtrip() {
        let limits = RiskLimits::default();
        let json = serde_json::to_string(&limits).unwrap();
        let back: RiskLimits = serde_json::from_str(&json).unwrap();
        assert_eq!(limits, back);
    }
}
