//! Engine orchestration
//!
//! Owns the instrument registry and the worker lifecycle. Submitters
//! enqueue validated orders; worker threads pull them, run the risk
//! gate, dispatch to the instrument book under its write lock, and fan
//! results out to the sinks. Books on distinct instruments match in
//! parallel; orders on one instrument serialize on its lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;

use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use risk_engine::{RiskEngine, RiskEventKind};
use types::config::EngineConfig;
use types::errors::{BookError, EngineError};
use types::ids::{OrderId, Symbol, UserId};
use types::numeric::{notional, Price, Quantity};
use types::order::{Order, OrderRequest, OrderResponse};
use types::trade::Trade;

use crate::book::order_book::{BookOrderView, Depth, OrderBook};
use crate::clock;
use crate::events::EngineSinks;
use crate::matching::executor::MatchExecutor;
use crate::queue::IngressQueue;
use crate::stats::{EngineStats, StatsSnapshot};

/// Engine lifecycle states.
///
/// `Error` is terminal until a manual restart; submission is accepted
/// only while `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EngineStatus {
    Stopped,
    Starting,
    Running,
    Stopping,
    Error,
}

impl EngineStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => EngineStatus::Stopped,
            1 => EngineStatus::Starting,
            2 => EngineStatus::Running,
            3 => EngineStatus::Stopping,
            _ => EngineStatus::Error,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            EngineStatus::Stopped => 0,
            EngineStatus::Starting => 1,
            EngineStatus::Running => 2,
            EngineStatus::Stopping => 3,
            EngineStatus::Error => 4,
        }
    }
}

/// The matching engine: instrument books, ingress queue, worker pool.
pub struct Engine {
    config: EngineConfig,
    instruments: HashMap<Symbol, RwLock<OrderBook>>,
    risk: Arc<RiskEngine>,
    queue: IngressQueue,
    sinks: EngineSinks,
    stats: EngineStats,
    status: AtomicU8,
    running: AtomicBool,
    next_order_id: AtomicU64,
    workers: Mutex<Vec<JoinHandle<()>>>,
    /// Handle back to the owning Arc, for spawning worker threads.
    self_handle: Weak<Engine>,
}

impl Engine {
    pub fn new(config: EngineConfig, risk: Arc<RiskEngine>, sinks: EngineSinks) -> Arc<Self> {
        let trade_sequence = Arc::new(AtomicU64::new(1));
        let instruments: HashMap<Symbol, RwLock<OrderBook>> = config
            .instruments
            .iter()
            .map(|name| {
                let symbol = Symbol::new(name.clone());
                let executor = MatchExecutor::with_sequence(Arc::clone(&trade_sequence));
                let book = OrderBook::with_executor(
                    symbol.clone(),
                    config.recent_trades_capacity,
                    executor,
                );
                (symbol, RwLock::new(book))
            })
            .collect();

        Arc::new_cyclic(|self_handle| Self {
            queue: IngressQueue::new(config.queue_size),
            config,
            instruments,
            risk,
            sinks,
            stats: EngineStats::new(),
            status: AtomicU8::new(EngineStatus::Stopped.as_u8()),
            running: AtomicBool::new(false),
            next_order_id: AtomicU64::new(1),
            workers: Mutex::new(Vec::new()),
            self_handle: self_handle.clone(),
        })
    }

    /// Spawn the worker pool and accept submissions.
    pub fn start(&self) {
        if !self.transition(EngineStatus::Stopped, EngineStatus::Starting) {
            warn!("engine already started");
            return;
        }
        self.running.store(true, Ordering::SeqCst);

        let mut workers = self.workers.lock();
        for worker_id in 0..self.config.processing_threads.max(1) {
            let engine = self
                .self_handle
                .upgrade()
                .expect("engine is owned by an Arc");
            workers.push(std::thread::spawn(move || engine.worker_loop(worker_id)));
        }
        drop(workers);

        self.set_status(EngineStatus::Running);
        self.sinks.emit_engine_status(EngineStatus::Running);
        info!(
            instruments = self.instruments.len(),
            workers = self.config.processing_threads.max(1),
            "engine running"
        );
    }

    /// Stop accepting orders, drain the queue, and join the workers.
    pub fn stop(&self) {
        if !self.transition(EngineStatus::Running, EngineStatus::Stopping) {
            warn!("engine is not running");
            return;
        }
        self.running.store(false, Ordering::SeqCst);

        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            let _ = worker.join();
        }

        self.set_status(EngineStatus::Stopped);
        self.sinks.emit_engine_status(EngineStatus::Stopped);
        info!("engine stopped");
    }

    /// Validate and enqueue a submission. Returns the assigned order id;
    /// the response arrives through the response sink once a worker has
    /// processed the order.
    pub fn submit(&self, request: OrderRequest) -> Result<OrderId, EngineError> {
        if self.status() != EngineStatus::Running {
            return Err(EngineError::EngineNotRunning);
        }
        if !self.instruments.contains_key(&request.symbol) {
            return Err(EngineError::Validation(format!(
                "unknown symbol: {}",
                request.symbol
            )));
        }
        if request.quantity.is_zero() {
            return Err(EngineError::Validation(
                "quantity must be positive".to_string(),
            ));
        }
        if request.kind.requires_price() && request.price.is_none() {
            return Err(EngineError::Validation(format!(
                "{} order requires a price",
                request.kind.label()
            )));
        }

        let order_id = OrderId::new(self.next_order_id.fetch_add(1, Ordering::Relaxed));
        // MARKET orders carry no limit price regardless of the request.
        let price = if request.kind.requires_price() {
            request.price
        } else {
            None
        };
        let order = Order::new(
            order_id,
            request.user_id,
            request.symbol,
            request.side,
            request.kind,
            price,
            request.quantity,
            clock::monotonic_ns(),
        );
        self.queue.push(order)?;
        Ok(order_id)
    }

    /// Cancel a live order owned by `user_id`. Benign false when the
    /// order is unknown, terminal, or owned by someone else.
    pub fn cancel_order(&self, order_id: OrderId, user_id: UserId) -> bool {
        for book in self.instruments.values() {
            let owner = book.read().owner_of(order_id);
            match owner {
                Some(owner) if owner == user_id => {
                    let mut book = book.write();
                    let cancelled = book.cancel(order_id);
                    if book.poisoned() {
                        self.fail("book state inconsistent during cancel");
                    }
                    return cancelled;
                }
                Some(_) => return false,
                None => {}
            }
        }
        false
    }

    /// Modify a live order owned by `user_id`. Trades triggered by a
    /// re-priced order flow to the sinks exactly like submissions.
    pub fn modify_order(
        &self,
        order_id: OrderId,
        user_id: UserId,
        new_quantity: Quantity,
        new_price: Option<Price>,
    ) -> bool {
        if new_quantity.is_zero() {
            return false;
        }
        for (symbol, book) in &self.instruments {
            let owner = book.read().owner_of(order_id);
            match owner {
                Some(owner) if owner == user_id => {
                    let (result, best_bid, depth) = {
                        let mut book = book.write();
                        let result =
                            book.modify(order_id, new_quantity, new_price, clock::wall_ns());
                        if book.poisoned() {
                            self.fail("book state inconsistent during modify");
                        }
                        (result, book.best_bid(), book.depth(self.config.depth_levels))
                    };
                    self.publish_trades(symbol, &result.trades, best_bid);
                    if !result.trades.is_empty() {
                        self.sinks.emit_depth(&depth);
                    }
                    return result.modified;
                }
                Some(_) => return false,
                None => {}
            }
        }
        false
    }

    pub fn depth(&self, symbol: &Symbol, levels: usize) -> Option<Depth> {
        Some(self.instruments.get(symbol)?.read().depth(levels))
    }

    pub fn recent_trades(&self, symbol: &Symbol, count: usize) -> Option<Vec<Trade>> {
        Some(self.instruments.get(symbol)?.read().recent_trades(count))
    }

    pub fn best_bid(&self, symbol: &Symbol) -> Option<Price> {
        self.instruments.get(symbol)?.read().best_bid()
    }

    pub fn best_ask(&self, symbol: &Symbol) -> Option<Price> {
        self.instruments.get(symbol)?.read().best_ask()
    }

    pub fn spread(&self, symbol: &Symbol) -> Option<Decimal> {
        self.instruments.get(symbol)?.read().spread()
    }

    /// Displayed orders for the book dump: (asks ascending, bids
    /// descending).
    pub fn book_orders(&self, symbol: &Symbol) -> Option<(Vec<BookOrderView>, Vec<BookOrderView>)> {
        let book = self.instruments.get(symbol)?.read();
        Some((book.ask_orders(), book.bid_orders()))
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.instruments.keys().cloned().collect();
        symbols.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        symbols
    }

    pub fn has_symbol(&self, symbol: &Symbol) -> bool {
        self.instruments.contains_key(symbol)
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn risk(&self) -> &Arc<RiskEngine> {
        &self.risk
    }

    // ── Worker pipeline ─────────────────────────────────────────────

    fn worker_loop(&self, worker_id: usize) {
        debug!(worker_id, "matching worker started");
        loop {
            match self.queue.pop() {
                Some(order) => self.process(order),
                None => {
                    // Drain fully before honoring shutdown.
                    if !self.running.load(Ordering::SeqCst) {
                        break;
                    }
                    std::thread::yield_now();
                }
            }
        }
        debug!(worker_id, "matching worker exited");
    }

    fn process(&self, mut order: Order) {
        let ingress_ns = order.timestamp;

        let (verdict, risk_events) = self.risk.check_order(&order, clock::monotonic_ns());
        self.publish_risk_events(&risk_events);
        if !verdict.is_pass() {
            self.stats.record_rejected();
            self.sinks
                .emit_response(&OrderResponse::rejected(order.order_id, verdict.reason()));
            return;
        }

        let Some(book) = self.instruments.get(&order.symbol) else {
            // Symbol validated at submit; losing it mid-flight is a bug.
            self.stats.record_rejected();
            self.sinks
                .emit_response(&OrderResponse::rejected(order.order_id, "unknown symbol"));
            return;
        };

        let submitted = {
            let mut book = book.write();
            let result = book.submit(&mut order, clock::wall_ns());
            match result {
                Ok(trades) => {
                    Ok((trades, book.best_bid(), book.depth(self.config.depth_levels)))
                }
                Err(err) => Err(err),
            }
        };

        let (trades, best_bid, depth) = match submitted {
            Ok(output) => output,
            Err(BookError::DuplicateOrderId(id)) => {
                self.stats.record_rejected();
                self.sinks
                    .emit_response(&OrderResponse::rejected(id, "duplicate order id"));
                return;
            }
            Err(BookError::InvariantViolation { detail }) => {
                self.fail(&detail);
                self.stats.record_rejected();
                self.sinks
                    .emit_response(&OrderResponse::rejected(order.order_id, "internal error"));
                return;
            }
        };

        // All trades reach the sinks before the response is observable.
        self.publish_trades(&order.symbol, &trades, best_bid);
        self.sinks.emit_depth(&depth);

        let response = build_response(&order, &trades);
        self.sinks.emit_response(&response);

        let traded_volume: Decimal = trades.iter().map(|t| t.quantity.as_decimal()).sum();
        let latency_ns = (clock::monotonic_ns() - ingress_ns).max(0) as u64;
        self.stats
            .record_processed(trades.len(), traded_volume, latency_ns);
    }

    fn publish_trades(&self, symbol: &Symbol, trades: &[Trade], best_bid: Option<Price>) {
        for trade in trades {
            self.sinks.emit_trade(trade);
            let events = self.risk.record_trade(trade, clock::monotonic_ns());
            self.publish_risk_events(&events);
        }
        if !trades.is_empty() {
            if let Some(best_bid) = best_bid {
                self.risk.update_market_price(symbol, best_bid);
            }
        }
    }

    fn publish_risk_events(&self, events: &[risk_engine::RiskEvent]) {
        for event in events {
            match &event.kind {
                RiskEventKind::SymbolHalted { symbol, reason } => {
                    self.sinks.emit_halt(Some(symbol), reason);
                }
                RiskEventKind::MarketHalted { reason } => {
                    self.sinks.emit_halt(None, reason);
                }
                _ => {}
            }
        }
    }

    /// Unrecoverable fault: log, stop intake, park in `Error`.
    fn fail(&self, detail: &str) {
        error!(detail, "engine entering ERROR state");
        self.running.store(false, Ordering::SeqCst);
        self.set_status(EngineStatus::Error);
        self.sinks.emit_engine_status(EngineStatus::Error);
    }

    fn transition(&self, from: EngineStatus, to: EngineStatus) -> bool {
        self.status
            .compare_exchange(
                from.as_u8(),
                to.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    fn set_status(&self, status: EngineStatus) {
        self.status.store(status.as_u8(), Ordering::SeqCst);
    }
}

/// Assemble the response from the order's final state and its trades.
fn build_response(order: &Order, trades: &[Trade]) -> OrderResponse {
    let filled: Quantity = trades
        .iter()
        .fold(Quantity::ZERO, |acc, t| acc + t.quantity);
    let average_price = if filled.is_zero() {
        None
    } else {
        let weighted: Decimal = trades.iter().map(|t| notional(t.price, t.quantity)).sum();
        Price::try_new(weighted / filled.as_decimal())
    };
    OrderResponse {
        order_id: order.order_id,
        status: order.status,
        filled_quantity: filled,
        average_price,
        message: String::new(),
    }
}
