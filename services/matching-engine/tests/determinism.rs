//! Determinism test
//!
//! Replays an identical seeded order flow into two fresh books and
//! requires byte-identical trades and depth. Matching has no hidden
//! state: same inputs, same outputs.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use matching_engine::book::order_book::OrderBook;
use types::ids::{OrderId, Symbol, UserId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderKind, Side};
use types::trade::Trade;

fn random_order(rng: &mut ChaCha8Rng, id: u64) -> Order {
    let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
    let price = rng.gen_range(90..110u64);
    let qty = rng.gen_range(1..200u64);
    let kind = match rng.gen_range(0..10u32) {
        0 => OrderKind::Market,
        1 => OrderKind::Ioc,
        2 => OrderKind::Fok,
        3 => OrderKind::Iceberg {
            peak: Quantity::from_u64((qty / 4).max(1)),
        },
        _ => OrderKind::Limit,
    };
    let price = if matches!(kind, OrderKind::Market) {
        None
    } else {
        Some(Price::from_u64(price))
    };
    Order::new(
        OrderId::new(id),
        UserId::new(rng.gen_range(1..5u64)),
        Symbol::new("AAPL"),
        side,
        kind,
        price,
        Quantity::from_u64(qty),
        id as i64,
    )
}

fn run(seed: u64, orders: usize) -> (Vec<Trade>, String) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut book = OrderBook::new(Symbol::new("AAPL"), 10_000);
    let mut all_trades = Vec::new();

    for id in 1..=orders as u64 {
        let mut order = random_order(&mut rng, id);
        let trades = book.submit(&mut order, id as i64).expect("submit");
        all_trades.extend(trades);
        book.validate().expect("book invariants hold");

        // Occasionally cancel a random live id.
        if rng.gen_bool(0.1) {
            let victim = OrderId::new(rng.gen_range(1..=id));
            book.cancel(victim);
            book.validate().expect("book invariants hold after cancel");
        }
    }

    let depth = book.depth(50);
    (all_trades, serde_json::to_string(&depth).unwrap())
}

#[test]
fn test_same_seed_same_outcome() {
    let (trades_a, depth_a) = run(42, 2_000);
    let (trades_b, depth_b) = run(42, 2_000);

    assert_eq!(trades_a, trades_b);
    assert_eq!(depth_a, depth_b);
    assert!(!trades_a.is_empty());
}

#[test]
fn test_different_seeds_diverge() {
    let (trades_a, _) = run(1, 500);
    let (trades_b, _) = run(2, 500);
    assert_ne!(trades_a, trades_b);
}

#[test]
fn test_trade_ids_strictly_increase() {
    let (trades, _) = run(7, 1_000);
    for pair in trades.windows(2) {
        assert!(pair[1].trade_id > pair[0].trade_id);
    }
}

#[test]
fn test_maker_price_rule_holds_for_random_flow() {
    // Every trade executes at a price no worse than the taker's limit.
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut book = OrderBook::new(Symbol::new("AAPL"), 10_000);

    for id in 1..=1_000u64 {
        let mut order = random_order(&mut rng, id);
        let limit = order.price;
        let side = order.side;
        let trades = book.submit(&mut order, id as i64).expect("submit");
        for trade in trades {
            if let Some(limit) = limit {
                match side {
                    Side::Buy => assert!(trade.price <= limit),
                    Side::Sell => assert!(trade.price >= limit),
                }
            }
        }
    }
}
