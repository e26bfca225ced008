//! Per-user position book
//!
//! Both counterparty user ids come from the trade record, so fills are
//! applied to the real buyer and seller. Equity is computed on demand
//! from cost basis and the latest market prices.

use std::collections::HashMap;

use dashmap::DashMap;
use rust_decimal::Decimal;

use types::ids::{Symbol, UserId};
use types::numeric::Price;
use types::position::Position;
use types::risk::RiskLimits;
use types::trade::Trade;

#[derive(Debug, Clone)]
struct PositionState {
    position: Position,
    /// Signed cost of the net position: buys add cost, sells remove it.
    net_cost: Decimal,
}

#[derive(Debug, Default)]
struct UserState {
    positions: HashMap<Symbol, PositionState>,
    daily_volume: Decimal,
    daily_notional: Decimal,
    limits: Option<RiskLimits>,
}

/// Concurrent store of user positions, daily tallies, and limit
/// overrides, plus the market-price map used for marking.
pub struct PositionBook {
    users: DashMap<UserId, UserState>,
    market_prices: DashMap<Symbol, Price>,
    default_limits: RiskLimits,
    starting_equity: Decimal,
}

impl PositionBook {
    pub fn new(default_limits: RiskLimits, starting_equity: Decimal) -> Self {
        Self {
            users: DashMap::new(),
            market_prices: DashMap::new(),
            default_limits,
            starting_equity,
        }
    }

    /// Apply a trade to both counterparties.
    pub fn record_trade(&self, trade: &Trade) {
        self.apply_side(trade.buy_user_id, trade, types::order::Side::Buy);
        self.apply_side(trade.sell_user_id, trade, types::order::Side::Sell);
    }

    fn apply_side(&self, user_id: UserId, trade: &Trade, side: types::order::Side) {
        let mut user = self.users.entry(user_id).or_default();
        let state = user
            .positions
            .entry(trade.symbol.clone())
            .or_insert_with(|| PositionState {
                position: Position::new(user_id, trade.symbol.clone()),
                net_cost: Decimal::ZERO,
            });

        state.position.apply_fill(side, trade.quantity, trade.price);
        match side {
            types::order::Side::Buy => state.net_cost += trade.notional(),
            types::order::Side::Sell => state.net_cost -= trade.notional(),
        }

        user.daily_volume += trade.quantity.as_decimal();
        user.daily_notional += trade.notional();
    }

    /// Store a new market price and re-mark every affected position.
    pub fn update_market_price(&self, symbol: &Symbol, price: Price) {
        self.market_prices.insert(symbol.clone(), price);
        for mut user in self.users.iter_mut() {
            if let Some(state) = user.positions.get_mut(symbol) {
                state.position.mark(price);
            }
        }
    }

    pub fn market_price(&self, symbol: &Symbol) -> Option<Price> {
        self.market_prices.get(symbol).map(|p| *p)
    }

    pub fn net_position(&self, user_id: UserId, symbol: &Symbol) -> Decimal {
        self.users
            .get(&user_id)
            .and_then(|u| u.positions.get(symbol).map(|s| s.position.net_position))
            .unwrap_or_default()
    }

    pub fn position(&self, user_id: UserId, symbol: &Symbol) -> Option<Position> {
        self.users
            .get(&user_id)
            .and_then(|u| u.positions.get(symbol).map(|s| s.position.clone()))
    }

    pub fn positions_of(&self, user_id: UserId) -> Vec<Position> {
        self.users
            .get(&user_id)
            .map(|u| u.positions.values().map(|s| s.position.clone()).collect())
            .unwrap_or_default()
    }

    /// Every position across all users, for periodic snapshots.
    pub fn all_positions(&self) -> Vec<Position> {
        self.users
            .iter()
            .flat_map(|u| {
                u.positions
                    .values()
                    .map(|s| s.position.clone())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn daily_volume(&self, user_id: UserId) -> Decimal {
        self.users
            .get(&user_id)
            .map(|u| u.daily_volume)
            .unwrap_or_default()
    }

    pub fn daily_notional(&self, user_id: UserId) -> Decimal {
        self.users
            .get(&user_id)
            .map(|u| u.daily_notional)
            .unwrap_or_default()
    }

    /// Current equity: starting equity plus unrealized PnL over all
    /// positions with a known market price.
    pub fn equity(&self, user_id: UserId) -> Decimal {
        let unrealized = self
            .users
            .get(&user_id)
            .map(|u| {
                u.positions
                    .iter()
                    .map(|(symbol, state)| match self.market_price(symbol) {
                        Some(mark) => {
                            state.position.net_position * mark.as_decimal() - state.net_cost
                        }
                        None => Decimal::ZERO,
                    })
                    .sum::<Decimal>()
            })
            .unwrap_or_default();
        self.starting_equity + unrealized
    }

    pub fn starting_equity(&self) -> Decimal {
        self.starting_equity
    }

    /// Effective limits for a user: override if set, defaults otherwise.
    pub fn limits_for(&self, user_id: UserId) -> RiskLimits {
        self.users
            .get(&user_id)
            .and_then(|u| u.limits.clone())
            .unwrap_or_else(|| self.default_limits.clone())
    }

    pub fn set_limits(&self, user_id: UserId, limits: RiskLimits) {
        self.users.entry(user_id).or_default().limits = Some(limits);
    }

    /// Day rollover: zero every user's daily tallies.
    pub fn reset_daily_counters(&self) {
        for mut user in self.users.iter_mut() {
            user.daily_volume = Decimal::ZERO;
            user.daily_notional = Decimal::ZERO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::{OrderId, TradeId};
    use types::numeric::Quantity;
    use types::order::Side;

    fn book() -> PositionBook {
        PositionBook::new(RiskLimits::default(), Decimal::from(1_000_000))
    }

    fn trade(id: u64, buyer: u64, seller: u64, qty: u64, price: u64) -> Trade {
        Trade::new(
            TradeId::new(id),
            Symbol::new("AAPL"),
            OrderId::new(id * 2),
            OrderId::new(id * 2 + 1),
            UserId::new(buyer),
            UserId::new(seller),
            Quantity::from_u64(qty),
            Price::from_u64(price),
            Side::Buy,
            id as i64,
        )
    }

    #[test]
    fn test_trade_applies_to_both_counterparties() {
        let book = book();
        book.record_trade(&trade(1, 1, 2, 100, 10));

        assert_eq!(book.net_position(UserId::new(1), &Symbol::new("AAPL")), Decimal::from(100));
        assert_eq!(book.net_position(UserId::new(2), &Symbol::new("AAPL")), Decimal::from(-100));
        assert_eq!(book.daily_volume(UserId::new(1)), Decimal::from(100));
        assert_eq!(book.daily_volume(UserId::new(2)), Decimal::from(100));
        assert_eq!(book.daily_notional(UserId::new(1)), Decimal::from(1_000));
    }

    #[test]
    fn test_unknown_user_has_flat_position() {
        let book = book();
        assert_eq!(book.net_position(UserId::new(9), &Symbol::new("AAPL")), Decimal::ZERO);
        assert!(book.position(UserId::new(9), &Symbol::new("AAPL")).is_none());
    }

    #[test]
    fn test_equity_follows_market_price() {
        let book = book();
        // Buyer pays 10 for 100.
        book.record_trade(&trade(1, 1, 2, 100, 10));
        book.update_market_price(&Symbol::new("AAPL"), Price::from_u64(10));
        assert_eq!(book.equity(UserId::new(1)), Decimal::from(1_000_000));

        // Mark to 12: buyer +200, seller -200.
        book.update_market_price(&Symbol::new("AAPL"), Price::from_u64(12));
        assert_eq!(book.equity(UserId::new(1)), Decimal::from(1_000_200));
        assert_eq!(book.equity(UserId::new(2)), Decimal::from(999_800));
    }

    #[test]
    fn test_limits_override() {
        let book = book();
        let user = UserId::new(1);
        assert_eq!(book.limits_for(user), RiskLimits::default());

        let tight = RiskLimits {
            max_order_size: Quantity::from_u64(10),
            ..RiskLimits::default()
        };
        book.set_limits(user, tight.clone());
        assert_eq!(book.limits_for(user), tight);
    }

    #[test]
    fn test_daily_reset() {
        let book = book();
        book.record_trade(&trade(1, 1, 2, 100, 10));
        assert!(!book.daily_volume(UserId::new(1)).is_zero());

        book.reset_daily_counters();
        assert!(book.daily_volume(UserId::new(1)).is_zero());
        assert!(book.daily_notional(UserId::new(2)).is_zero());
        // Positions survive the rollover.
        assert_eq!(book.net_position(UserId::new(1), &Symbol::new("AAPL")), Decimal::from(100));
    }

    #[test]
    fn test_all_positions_snapshot() {
        let book = book();
        book.record_trade(&trade(1, 1, 2, 100, 10));
        let snapshot = book.all_positions();
        assert_eq!(snapshot.len(), 2);
    }
}
