//! Sink interfaces for engine output
//!
//! The engine pushes responses, trades, and market data through these
//! traits; the gateway wires concrete implementations (feed hub,
//! storage writer, response router). Sink calls must not block the
//! matching path, and sink failures are the sink's problem: the engine
//! treats them as non-fatal.

use std::sync::Arc;

use types::ids::Symbol;
use types::order::OrderResponse;
use types::trade::Trade;

use crate::book::order_book::Depth;
use crate::engine::EngineStatus;

/// Receives the terminal response for each processed order.
pub trait ResponseSink: Send + Sync {
    fn on_response(&self, response: &OrderResponse);
}

/// Receives every executed trade, in per-instrument execution order.
pub trait TradeSink: Send + Sync {
    fn on_trade(&self, trade: &Trade);
}

/// Receives market-data updates: depth refreshes, engine status
/// transitions, and circuit-breaker halts.
pub trait MarketDataSink: Send + Sync {
    fn on_depth(&self, depth: &Depth);
    fn on_engine_status(&self, status: EngineStatus);
    fn on_halt(&self, symbol: Option<&Symbol>, reason: &str);
}

/// The engine's fan-out targets.
#[derive(Default, Clone)]
pub struct EngineSinks {
    responses: Vec<Arc<dyn ResponseSink>>,
    trades: Vec<Arc<dyn TradeSink>>,
    market_data: Vec<Arc<dyn MarketDataSink>>,
}

impl EngineSinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_response_sink(mut self, sink: Arc<dyn ResponseSink>) -> Self {
        self.responses.push(sink);
        self
    }

    pub fn add_trade_sink(mut self, sink: Arc<dyn TradeSink>) -> Self {
        self.trades.push(sink);
        self
    }

    pub fn add_market_data_sink(mut self, sink: Arc<dyn MarketDataSink>) -> Self {
        self.market_data.push(sink);
        self
    }

    pub fn emit_response(&self, response: &OrderResponse) {
        for sink in &self.responses {
            sink.on_response(response);
        }
    }

    pub fn emit_trade(&self, trade: &Trade) {
        for sink in &self.trades {
            sink.on_trade(trade);
        }
    }

    pub fn emit_depth(&self, depth: &Depth) {
        for sink in &self.market_data {
            sink.on_depth(depth);
        }
    }

    pub fn emit_engine_status(&self, status: EngineStatus) {
        for sink in &self.market_data {
            sink.on_engine_status(status);
        }
    }

    pub fn emit_halt(&self, symbol: Option<&Symbol>, reason: &str) {
        for sink in &self.market_data {
            sink.on_halt(symbol, reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use types::ids::OrderId;
    use types::numeric::Quantity;
    use types::order::OrderStatus;

    #[derive(Default)]
    struct Recorder {
        responses: Mutex<Vec<OrderResponse>>,
    }

    impl ResponseSink for Recorder {
        fn on_response(&self, response: &OrderResponse) {
            self.responses.lock().push(response.clone());
        }
    }

    #[test]
    fn test_fan_out_reaches_every_sink() {
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        let sinks = EngineSinks::new()
            .add_response_sink(a.clone())
            .add_response_sink(b.clone());

        let response = OrderResponse {
            order_id: OrderId::new(1),
            status: OrderStatus::Filled,
            filled_quantity: Quantity::from_u64(5),
            average_price: None,
            message: String::new(),
        };
        sinks.emit_response(&response);

        assert_eq!(a.responses.lock().len(), 1);
        assert_eq!(b.responses.lock().len(), 1);
    }
}
