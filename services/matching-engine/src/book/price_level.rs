//! Price level with a FIFO queue of resting orders
//!
//! A level owns the full state of every order resting at its price:
//! the remaining quantity, the owner, and (for icebergs) the display
//! state. The level caches its total visible quantity so depth queries
//! never walk the queue.

use std::collections::VecDeque;
use types::ids::{OrderId, UserId};
use types::numeric::Quantity;

/// Display state of a resting iceberg order.
///
/// Invariant: `visible + hidden` equals the order's remaining quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcebergState {
    pub peak: Quantity,
    pub visible: Quantity,
    pub hidden: Quantity,
}

impl IcebergState {
    /// Split a remaining quantity into an initial visible/hidden pair.
    pub fn new(peak: Quantity, remaining: Quantity) -> Self {
        let visible = peak.min(remaining);
        Self {
            peak,
            visible,
            hidden: remaining - visible,
        }
    }

    /// Move hidden quantity into the display after the visible portion
    /// was consumed. Returns the replenished amount.
    pub fn replenish(&mut self) -> Quantity {
        let amount = self.peak.min(self.hidden);
        self.visible = amount;
        self.hidden = self.hidden - amount;
        amount
    }
}

/// One resting order in a level's FIFO.
#[derive(Debug, Clone, PartialEq)]
pub struct RestingOrder {
    pub order_id: OrderId,
    pub user_id: UserId,
    /// Current total quantity (modify can shrink it).
    pub quantity: Quantity,
    pub filled: Quantity,
    pub iceberg: Option<IcebergState>,
    /// Ingress timestamp; refreshed when time priority is forfeited.
    pub timestamp: i64,
}

impl RestingOrder {
    pub fn remaining(&self) -> Quantity {
        self.quantity.saturating_sub(self.filled)
    }

    /// Quantity exposed to matching and depth. Equals `remaining` for
    /// plain limit orders, the visible tranche for icebergs.
    pub fn visible(&self) -> Quantity {
        match self.iceberg {
            Some(ice) => ice.visible,
            None => self.remaining(),
        }
    }
}

/// Result of filling against the front of a level.
#[derive(Debug, Clone, PartialEq)]
pub enum FrontFill {
    /// Front order keeps displayed quantity and its queue position.
    Partial,
    /// Front order fully filled and removed from the level.
    Completed(RestingOrder),
    /// Iceberg display exhausted; replenished from hidden quantity and
    /// moved to the back of the queue, losing time priority.
    Replenished,
}

/// Outcome of an in-place quantity reduction.
#[derive(Debug, Clone, PartialEq)]
pub enum Reduce {
    /// New total at or below the filled quantity; remainder cancelled.
    Removed(RestingOrder),
    /// Quantity reduced in place; time priority preserved.
    Reduced,
    NotFound,
}

/// All orders resting at a single price, in strict FIFO order.
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    orders: VecDeque<RestingOrder>,
    visible_quantity: Quantity,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
            visible_quantity: Quantity::ZERO,
        }
    }

    /// Append an order at the back of the queue (lowest time priority).
    pub fn push_back(&mut self, order: RestingOrder) {
        self.visible_quantity += order.visible();
        self.orders.push_back(order);
    }

    /// Remove an order by id from anywhere in the queue.
    pub fn remove(&mut self, order_id: OrderId) -> Option<RestingOrder> {
        let position = self.orders.iter().position(|o| o.order_id == order_id)?;
        let order = self.orders.remove(position)?;
        self.visible_quantity = self.visible_quantity.saturating_sub(order.visible());
        Some(order)
    }

    pub fn front(&self) -> Option<&RestingOrder> {
        self.orders.front()
    }

    pub fn get(&self, order_id: OrderId) -> Option<&RestingOrder> {
        self.orders.iter().find(|o| o.order_id == order_id)
    }

    /// Fill `quantity` against the front order.
    ///
    /// `quantity` must not exceed the front order's visible quantity;
    /// the caller computes it as `min(aggressor remaining, visible)`.
    pub fn fill_front(&mut self, quantity: Quantity) -> Option<FrontFill> {
        let front = self.orders.front_mut()?;
        debug_assert!(quantity <= front.visible(), "fill exceeds visible quantity");

        front.filled += quantity;
        if let Some(ice) = &mut front.iceberg {
            ice.visible = ice.visible.saturating_sub(quantity);
        }
        self.visible_quantity = self.visible_quantity.saturating_sub(quantity);

        if front.remaining().is_zero() {
            let done = self.orders.pop_front().expect("front exists");
            return Some(FrontFill::Completed(done));
        }

        if front.visible().is_zero() {
            // Hidden quantity remains; rotate to the back with a fresh tranche.
            let mut order = self.orders.pop_front().expect("front exists");
            let replenished = order
                .iceberg
                .as_mut()
                .expect("only icebergs have zero visible with remaining quantity")
                .replenish();
            self.visible_quantity += replenished;
            self.orders.push_back(order);
            return Some(FrontFill::Replenished);
        }

        Some(FrontFill::Partial)
    }

    /// Shrink an order's total quantity in place, keeping its queue
    /// position. A target at or below the filled quantity cancels the
    /// remainder instead.
    pub fn reduce(&mut self, order_id: OrderId, new_total: Quantity) -> Reduce {
        let Some(position) = self.orders.iter().position(|o| o.order_id == order_id) else {
            return Reduce::NotFound;
        };

        if new_total <= self.orders[position].filled {
            let order = self.orders.remove(position).expect("position is valid");
            self.visible_quantity = self.visible_quantity.saturating_sub(order.visible());
            return Reduce::Removed(order);
        }

        let order = &mut self.orders[position];
        let old_visible = order.visible();
        order.quantity = new_total;
        if let Some(ice) = &mut order.iceberg {
            let remaining = order.quantity.saturating_sub(order.filled);
            ice.visible = ice.visible.min(remaining);
            ice.hidden = remaining - ice.visible;
        }
        let new_visible = self.orders[position].visible();
        self.visible_quantity = self.visible_quantity.saturating_sub(old_visible) + new_visible;
        Reduce::Reduced
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Total displayed quantity at this price.
    pub fn visible_quantity(&self) -> Quantity {
        self.visible_quantity
    }

    /// Total remaining quantity including hidden iceberg remainders.
    /// Walks the queue; used only by the FOK dry pass.
    pub fn total_remaining(&self) -> Quantity {
        self.orders
            .iter()
            .fold(Quantity::ZERO, |acc, o| acc + o.remaining())
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RestingOrder> + '_ {
        self.orders.iter()
    }
}
