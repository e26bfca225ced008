//! Ask (sell-side) half of the book
//!
//! Mirror of the bid side: the best ask is the lowest price, so
//! best-first iteration walks the BTreeMap forwards.

use std::collections::BTreeMap;
use types::numeric::{Price, Quantity};

use super::price_level::{PriceLevel, RestingOrder};

/// Sell-side price levels, best (lowest) price first.
#[derive(Debug, Clone, Default)]
pub struct AskBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl AskBook {
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Rest an order at the back of its price level's queue.
    pub fn insert(&mut self, price: Price, order: RestingOrder) {
        self.levels.entry(price).or_default().push_back(order);
    }

    /// Remove a specific order; drops the level if it empties.
    pub fn remove(&mut self, order_id: types::ids::OrderId, price: Price) -> Option<RestingOrder> {
        let level = self.levels.get_mut(&price)?;
        let removed = level.remove(order_id)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Some(removed)
    }

    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next().copied()
    }

    pub fn level_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    pub fn level(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    /// Drop the level at `price` if it has no orders left.
    pub fn prune(&mut self, price: Price) {
        if self.levels.get(&price).is_some_and(|l| l.is_empty()) {
            self.levels.remove(&price);
        }
    }

    /// Best-first iteration over (price, level).
    pub fn levels(&self) -> impl Iterator<Item = (Price, &PriceLevel)> + '_ {
        self.levels.iter().map(|(p, l)| (*p, l))
    }

    /// Top-N aggregated levels: (price, visible quantity, order count).
    pub fn depth(&self, count: usize) -> Vec<(Price, Quantity, usize)> {
        self.levels
            .iter()
            .take(count)
            .map(|(price, level)| (*price, level.visible_quantity(), level.order_count()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::{OrderId, UserId};

    fn resting(id: u64, qty: u64) -> RestingOrder {
        RestingOrder {
            order_id: OrderId::new(id),
            user_id: UserId::new(1),
            quantity: Quantity::from_u64(qty),
            filled: Quantity::ZERO,
            iceberg: None,
            timestamp: id as i64,
        }
    }

    #[test]
    fn test_best_price_is_lowest() {
        let mut book = AskBook::new();
        book.insert(Price::from_u64(12), resting(1, 5));
        book.insert(Price::from_u64(10), resting(2, 5));
        book.insert(Price::from_u64(11), resting(3, 5));

        assert_eq!(book.best_price(), Some(Price::from_u64(10)));
    }

    #[test]
    fn test_depth_ascending() {
        let mut book = AskBook::new();
        book.insert(Price::from_u64(12), resting(1, 5));
        book.insert(Price::from_u64(10), resting(2, 7));
        book.insert(Price::from_u64(11), resting(3, 9));

        let depth = book.depth(2);
        assert_eq!(depth.len(), 2);
        assert_eq!(depth[0], (Price::from_u64(10), Quantity::from_u64(7), 1));
        assert_eq!(depth[1], (Price::from_u64(11), Quantity::from_u64(9), 1));
    }

    #[test]
    fn test_levels_iterates_best_first() {
        let mut book = AskBook::new();
        book.insert(Price::from_u64(12), resting(1, 5));
        book.insert(Price::from_u64(10), resting(2, 5));

        let prices: Vec<Price> = book.levels().map(|(p, _)| p).collect();
        assert_eq!(prices, vec![Price::from_u64(10), Price::from_u64(12)]);
    }

    #[test]
    fn test_prune_keeps_nonempty_level() {
        let mut book = AskBook::new();
        book.insert(Price::from_u64(10), resting(1, 5));
        book.prune(Price::from_u64(10));
        assert_eq!(book.level_count(), 1);
    }
}
