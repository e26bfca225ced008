//! Pre-trade limit checks
//!
//! Pure functions over user state and limits; the risk engine runs
//! them in order and stops at the first failure.

use rust_decimal::Decimal;

use types::numeric::{notional, Price, Quantity};
use types::order::Side;
use types::risk::{RiskCheckResult, RiskLimits};

/// Order quantity against the per-user maximum order size.
pub fn check_order_size(quantity: Quantity, limits: &RiskLimits) -> RiskCheckResult {
    if quantity > limits.max_order_size {
        return RiskCheckResult::OrderSizeExceeded {
            limit: limits.max_order_size,
            requested: quantity,
        };
    }
    RiskCheckResult::Pass
}

/// Projected net position against the ±maxPosition band.
pub fn check_position(
    current_net: Decimal,
    side: Side,
    quantity: Quantity,
    limits: &RiskLimits,
) -> RiskCheckResult {
    let projected = match side {
        Side::Buy => current_net + quantity.as_decimal(),
        Side::Sell => current_net - quantity.as_decimal(),
    };
    if projected.abs() > limits.max_position {
        return RiskCheckResult::PositionLimitExceeded {
            limit: limits.max_position,
            projected,
        };
    }
    RiskCheckResult::Pass
}

/// Single-order notional, and the running daily notional when a daily
/// cap is configured. MARKET orders with no known market price cannot
/// be priced and skip this check.
pub fn check_notional(
    price: Option<Price>,
    quantity: Quantity,
    daily_notional: Decimal,
    limits: &RiskLimits,
) -> RiskCheckResult {
    let Some(price) = price else {
        return RiskCheckResult::Pass;
    };
    let value = notional(price, quantity);
    if value > limits.max_notional {
        return RiskCheckResult::NotionalExceeded {
            limit: limits.max_notional,
            requested: value,
        };
    }
    if let Some(daily_limit) = limits.daily_notional_limit {
        let projected = daily_notional + value;
        if projected > daily_limit {
            return RiskCheckResult::NotionalExceeded {
                limit: daily_limit,
                requested: projected,
            };
        }
    }
    RiskCheckResult::Pass
}

/// Running daily traded volume plus this order against the cap.
pub fn check_daily_volume(
    daily_volume: Decimal,
    quantity: Quantity,
    limits: &RiskLimits,
) -> RiskCheckResult {
    let projected = daily_volume + quantity.as_decimal();
    if projected > limits.daily_volume_limit {
        return RiskCheckResult::DailyVolumeExceeded {
            limit: limits.daily_volume_limit,
            projected,
        };
    }
    RiskCheckResult::Pass
}

/// Current equity over starting equity against the drawdown floor.
pub fn check_drawdown(
    current_equity: Decimal,
    starting_equity: Decimal,
    limits: &RiskLimits,
) -> RiskCheckResult {
    if starting_equity.is_zero() {
        return RiskCheckResult::Pass;
    }
    let ratio = current_equity / starting_equity;
    let floor = Decimal::ONE - limits.max_drawdown;
    if ratio < floor {
        return RiskCheckResult::DrawdownExceeded {
            limit: floor,
            current: ratio,
        };
    }
    RiskCheckResult::Pass
}

/// MARKET orders only: the current market price must exist and sit
/// within the configured band around the reference price.
pub fn check_price_deviation(
    market_price: Option<Price>,
    reference_price: Option<Price>,
    limits: &RiskLimits,
) -> RiskCheckResult {
    let Some(limit_pct) = limits.max_price_deviation_pct else {
        return RiskCheckResult::Pass;
    };
    let (Some(market), Some(reference)) = (market_price, reference_price) else {
        return RiskCheckResult::PriceDeviationExceeded {
            reference: reference_price,
            limit_pct,
        };
    };
    let reference_value = reference.as_decimal();
    let deviation = ((market.as_decimal() - reference_value) / reference_value).abs();
    if deviation > limit_pct {
        return RiskCheckResult::PriceDeviationExceeded {
            reference: Some(reference),
            limit_pct,
        };
    }
    RiskCheckResult::Pass
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> RiskLimits {
        RiskLimits {
            max_order_size: Quantity::from_u64(500),
            max_position: Decimal::from(1_000),
            max_notional: Decimal::from(10_000),
            daily_volume_limit: Decimal::from(2_000),
            daily_notional_limit: None,
            max_drawdown: Decimal::new(25, 2),
            max_price_deviation_pct: Some(Decimal::new(5, 2)),
        }
    }

    #[test]
    fn test_order_size() {
        let limits = limits();
        assert!(check_order_size(Quantity::from_u64(500), &limits).is_pass());
        let result = check_order_size(Quantity::from_u64(600), &limits);
        assert_eq!(result.check_name(), "order_size");
        assert_eq!(result.suggested_limit(), Some(Decimal::from(500)));
    }

    #[test]
    fn test_position_band_is_symmetric() {
        let limits = limits();
        assert!(check_position(Decimal::from(900), Side::Buy, Quantity::from_u64(100), &limits).is_pass());
        assert!(!check_position(Decimal::from(950), Side::Buy, Quantity::from_u64(100), &limits).is_pass());
        // Short side breaches too.
        assert!(!check_position(Decimal::from(-950), Side::Sell, Quantity::from_u64(100), &limits).is_pass());
        // Selling from a long position reduces exposure.
        assert!(check_position(Decimal::from(1_000), Side::Sell, Quantity::from_u64(100), &limits).is_pass());
    }

    #[test]
    fn test_notional_single_order() {
        let limits = limits();
        assert!(check_notional(
            Some(Price::from_u64(100)),
            Quantity::from_u64(100),
            Decimal::ZERO,
            &limits
        )
        .is_pass());
        assert!(!check_notional(
            Some(Price::from_u64(101)),
            Quantity::from_u64(100),
            Decimal::ZERO,
            &limits
        )
        .is_pass());
    }

    #[test]
    fn test_notional_daily_cap() {
        let mut limits = limits();
        limits.daily_notional_limit = Some(Decimal::from(15_000));
        // 10k single order is fine, but 8k already done today pushes past 15k.
        let result = check_notional(
            Some(Price::from_u64(100)),
            Quantity::from_u64(100),
            Decimal::from(8_000),
            &limits,
        );
        assert!(!result.is_pass());
        assert_eq!(result.suggested_limit(), Some(Decimal::from(15_000)));
    }

    #[test]
    fn test_notional_unpriceable_market_order_passes() {
        let limits = limits();
        assert!(check_notional(None, Quantity::from_u64(100), Decimal::ZERO, &limits).is_pass());
    }

    #[test]
    fn test_daily_volume() {
        let limits = limits();
        assert!(check_daily_volume(Decimal::from(1_900), Quantity::from_u64(100), &limits).is_pass());
        assert!(!check_daily_volume(Decimal::from(1_901), Quantity::from_u64(100), &limits).is_pass());
    }

    #[test]
    fn test_drawdown() {
        let limits = limits();
        // 25% drawdown floor = equity ratio 0.75.
        assert!(check_drawdown(Decimal::from(75), Decimal::from(100), &limits).is_pass());
        let result = check_drawdown(Decimal::from(74), Decimal::from(100), &limits);
        assert_eq!(result.check_name(), "drawdown");
    }

    #[test]
    fn test_price_deviation() {
        let limits = limits();
        // Within 5%.
        assert!(check_price_deviation(
            Some(Price::from_u64(104)),
            Some(Price::from_u64(100)),
            &limits
        )
        .is_pass());
        // Beyond 5%.
        assert!(!check_price_deviation(
            Some(Price::from_u64(106)),
            Some(Price::from_u64(100)),
            &limits
        )
        .is_pass());
        // Missing reference fails when the check is configured.
        assert!(!check_price_deviation(Some(Price::from_u64(100)), None, &limits).is_pass());
    }

    #[test]
    fn test_price_deviation_disabled() {
        let mut limits = limits();
        limits.max_price_deviation_pct = None;
        assert!(check_price_deviation(None, None, &limits).is_pass());
    }
}
