//! Matching hot-path benchmarks
//!
//! Measures raw book throughput without the queue or locks: resting
//! inserts, crossing flow, and depth snapshots.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use matching_engine::book::order_book::OrderBook;
use types::ids::{OrderId, Symbol, UserId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderKind, Side};

fn limit(id: u64, side: Side, price: u64, qty: u64) -> Order {
    Order::new(
        OrderId::new(id),
        UserId::new(1),
        Symbol::new("AAPL"),
        side,
        OrderKind::Limit,
        Some(Price::from_u64(price)),
        Quantity::from_u64(qty),
        id as i64,
    )
}

fn bench_resting_inserts(c: &mut Criterion) {
    c.bench_function("insert_1000_resting", |b| {
        b.iter(|| {
            let mut book = OrderBook::new(Symbol::new("AAPL"), 1_000);
            for id in 1..=1_000u64 {
                let price = 100 + (id % 50);
                let mut order = limit(id, Side::Buy, price, 10);
                book.submit(black_box(&mut order), id as i64).unwrap();
            }
            black_box(book.total_orders())
        })
    });
}

fn bench_crossing_flow(c: &mut Criterion) {
    c.bench_function("cross_1000_pairs", |b| {
        b.iter(|| {
            let mut book = OrderBook::new(Symbol::new("AAPL"), 1_000);
            let mut trades = 0usize;
            for id in 1..=1_000u64 {
                let mut sell = limit(id * 2 - 1, Side::Sell, 100, 10);
                book.submit(&mut sell, id as i64).unwrap();
                let mut buy = limit(id * 2, Side::Buy, 100, 10);
                trades += book.submit(&mut buy, id as i64).unwrap().len();
            }
            black_box(trades)
        })
    });
}

fn bench_depth_snapshot(c: &mut Criterion) {
    let mut book = OrderBook::new(Symbol::new("AAPL"), 1_000);
    for id in 1..=2_000u64 {
        let side = if id % 2 == 0 { Side::Buy } else { Side::Sell };
        let price = if id % 2 == 0 { 100 - (id % 40) } else { 101 + (id % 40) };
        let mut order = limit(id, side, price, 10);
        book.submit(&mut order, id as i64).unwrap();
    }

    c.bench_function("depth_top10", |b| {
        b.iter(|| black_box(book.depth(10)))
    });
}

criterion_group!(
    benches,
    bench_resting_inserts,
    bench_crossing_flow,
    bench_depth_snapshot
);
criterion_main!(benches);
