//! Marketability predicates
//!
//! An aggressor may trade at a level only if its limit price allows
//! execution there; MARKET orders carry no limit and cross everything.

use types::numeric::Price;
use types::order::Side;

/// Whether an aggressor with `limit` may execute at `level_price`.
///
/// BUY: limit >= level; SELL: limit <= level. `None` (MARKET) always
/// crosses.
pub fn marketable(side: Side, limit: Option<Price>, level_price: Price) -> bool {
    match limit {
        None => true,
        Some(limit) => match side {
            Side::Buy => limit >= level_price,
            Side::Sell => limit <= level_price,
        },
    }
}

/// Whether a bid/ask pair is crossed (would still match).
pub fn crossed(bid: Price, ask: Price) -> bool {
    bid >= ask
}
