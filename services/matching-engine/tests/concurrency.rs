//! Concurrency tests
//!
//! Multiple producers against the full engine pipeline: every
//! submission gets exactly one response, quantity is conserved, and
//! distinct instruments make progress in parallel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use matching_engine::{Engine, EngineSinks, ResponseSink, TradeSink};
use risk_engine::RiskEngine;
use types::config::{EngineConfig, RiskConfig};
use types::ids::{Symbol, UserId};
use types::numeric::{Price, Quantity};
use types::order::{OrderKind, OrderRequest, OrderResponse, Side};
use types::risk::BreakerLimits;
use types::trade::Trade;

#[derive(Default)]
struct Counters {
    responses: AtomicU64,
    trades: AtomicU64,
}

impl ResponseSink for Counters {
    fn on_response(&self, _response: &OrderResponse) {
        self.responses.fetch_add(1, Ordering::SeqCst);
    }
}

impl TradeSink for Counters {
    fn on_trade(&self, _trade: &Trade) {
        self.trades.fetch_add(1, Ordering::SeqCst);
    }
}

fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) {
    let start = Instant::now();
    while !done() {
        assert!(start.elapsed() < deadline, "timed out waiting for drain");
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn request(user: u64, symbol: &str, side: Side, price: u64, qty: u64) -> OrderRequest {
    OrderRequest {
        user_id: UserId::new(user),
        symbol: Symbol::new(symbol),
        side,
        kind: OrderKind::Limit,
        price: Some(Price::from_u64(price)),
        quantity: Quantity::from_u64(qty),
        client_order_id: None,
    }
}

#[test]
fn test_every_submission_gets_one_response() {
    let counters = Arc::new(Counters::default());
    let risk = Arc::new(RiskEngine::new(
        &RiskConfig::default(),
        BreakerLimits::default(),
    ));
    let sinks = EngineSinks::new()
        .add_response_sink(counters.clone())
        .add_trade_sink(counters.clone());
    let config = EngineConfig {
        processing_threads: 4,
        queue_size: 4_096,
        instruments: vec!["AAPL".to_string(), "MSFT".to_string()],
        ..EngineConfig::default()
    };
    let engine = Engine::new(config, risk, sinks);
    engine.start();

    // Four producers, two instruments, matched buy/sell pairs.
    let producers: Vec<_> = (0..4u64)
        .map(|producer| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                let symbol = if producer % 2 == 0 { "AAPL" } else { "MSFT" };
                for i in 0..250 {
                    let side = if i % 2 == 0 { Side::Sell } else { Side::Buy };
                    engine
                        .submit(request(producer + 1, symbol, side, 100, 10))
                        .expect("submit");
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    wait_until(Duration::from_secs(10), || {
        counters.responses.load(Ordering::SeqCst) == 1_000
    });
    engine.stop();

    // Sell/buy pairs at one price fully cross per instrument.
    assert_eq!(counters.responses.load(Ordering::SeqCst), 1_000);
    let stats = engine.stats();
    assert_eq!(stats.orders_processed, 1_000);
    assert_eq!(
        stats.trades_executed,
        counters.trades.load(Ordering::SeqCst)
    );

    // Quantity conservation: every trade moved 10, volume matches.
    let trades = counters.trades.load(Ordering::SeqCst);
    assert_eq!(
        stats.volume,
        rust_decimal::Decimal::from(trades * 10)
    );
}

#[test]
fn test_instruments_progress_independently() {
    let risk = Arc::new(RiskEngine::new(
        &RiskConfig::default(),
        BreakerLimits::default(),
    ));
    let config = EngineConfig {
        processing_threads: 2,
        queue_size: 1_024,
        instruments: vec!["AAPL".to_string(), "MSFT".to_string()],
        ..EngineConfig::default()
    };
    let engine = Engine::new(config, risk, EngineSinks::new());
    engine.start();

    for i in 0..100 {
        let side = if i % 2 == 0 { Side::Sell } else { Side::Buy };
        engine.submit(request(1, "AAPL", side, 50, 5)).unwrap();
        engine.submit(request(2, "MSFT", side, 70, 5)).unwrap();
    }

    wait_until(Duration::from_secs(10), || engine.queue_len() == 0);
    engine.stop();

    // Both books saw their own flow; nothing leaked across symbols.
    let aapl = engine.recent_trades(&Symbol::new("AAPL"), 1_000).unwrap();
    let msft = engine.recent_trades(&Symbol::new("MSFT"), 1_000).unwrap();
    assert!(!aapl.is_empty());
    assert!(!msft.is_empty());
    assert!(aapl.iter().all(|t| t.symbol.as_str() == "AAPL"));
    assert!(msft.iter().all(|t| t.symbol.as_str() == "MSFT"));
    assert!(aapl.iter().all(|t| t.price == Price::from_u64(50)));
    assert!(msft.iter().all(|t| t.price == Price::from_u64(70)));
}

#[test]
fn test_shutdown_drains_queue() {
    let counters = Arc::new(Counters::default());
    let risk = Arc::new(RiskEngine::new(
        &RiskConfig::default(),
        BreakerLimits::default(),
    ));
    let sinks = EngineSinks::new().add_response_sink(counters.clone());
    let config = EngineConfig {
        processing_threads: 1,
        queue_size: 1_024,
        instruments: vec!["AAPL".to_string()],
        ..EngineConfig::default()
    };
    let engine = Engine::new(config, risk, sinks);
    engine.start();

    for _ in 0..500 {
        engine
            .submit(request(1, "AAPL", Side::Buy, 10, 1))
            .expect("submit");
    }
    // Stop joins the worker, which drains everything first.
    engine.stop();

    assert_eq!(counters.responses.load(Ordering::SeqCst), 500);
    assert_eq!(engine.queue_len(), 0);

    // Submission after stop is refused.
    let err = engine.submit(request(1, "AAPL", Side::Buy, 10, 1)).unwrap_err();
    assert_eq!(err, types::errors::EngineError::EngineNotRunning);
}
