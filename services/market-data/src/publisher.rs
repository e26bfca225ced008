//! Feed hub
//!
//! Fan-out point for the pub/sub feed. Messages are two-frame
//! (topic, JSON payload). Each subscriber has a bounded queue with a
//! drop-oldest overflow policy, so a lagging consumer can never block
//! or bloat the matching path.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::json;
use tracing::debug;

use matching_engine::book::order_book::Depth;
use matching_engine::{clock, EngineStatus, MarketDataSink, TradeSink};
use types::ids::Symbol;
use types::trade::Trade;

use crate::depth::DepthUpdate;
use crate::trades::{PublicTrade, TradeBuffer};

/// Feed topic names.
pub mod topics {
    use types::ids::Symbol;

    pub const STATUS: &str = "status";

    pub fn trades(symbol: &Symbol) -> String {
        format!("trades.{symbol}")
    }

    pub fn depth(symbol: &Symbol) -> String {
        format!("depth.{symbol}")
    }
}

/// One two-frame feed message.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedMessage {
    pub topic: String,
    pub payload: String,
}

impl FeedMessage {
    /// Wire form: topic, single space, payload.
    pub fn encode(&self) -> String {
        format!("{} {}", self.topic, self.payload)
    }
}

/// Bounded per-subscriber queue; overflow drops the oldest message.
#[derive(Debug)]
struct SubscriberQueue {
    messages: VecDeque<FeedMessage>,
    capacity: usize,
    dropped: u64,
    lagging: bool,
}

impl SubscriberQueue {
    fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
            lagging: false,
        }
    }

    fn enqueue(&mut self, message: FeedMessage) {
        if self.messages.len() >= self.capacity {
            self.messages.pop_front();
            self.dropped += 1;
            self.lagging = true;
        }
        self.messages.push_back(message);
        if self.messages.len() < self.capacity / 2 {
            self.lagging = false;
        }
    }

    fn drain(&mut self) -> Vec<FeedMessage> {
        self.lagging = false;
        self.messages.drain(..).collect()
    }
}

/// Pub/sub fan-out hub; also the engine's market-data and trade sink.
pub struct FeedHub {
    subscribers: Mutex<HashMap<u64, SubscriberQueue>>,
    next_subscriber: AtomicU64,
    buffers: DashMap<Symbol, TradeBuffer>,
    queue_capacity: usize,
    trade_history: usize,
    published: AtomicU64,
    dropped: AtomicU64,
}

impl FeedHub {
    pub fn new(queue_capacity: usize, trade_history: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_subscriber: AtomicU64::new(1),
            buffers: DashMap::new(),
            queue_capacity,
            trade_history,
            published: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Register a subscriber; returns its id for drain/unsubscribe.
    pub fn subscribe(&self) -> u64 {
        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .insert(id, SubscriberQueue::new(self.queue_capacity));
        debug!(subscriber = id, "feed subscriber connected");
        id
    }

    pub fn unsubscribe(&self, id: u64) {
        self.subscribers.lock().remove(&id);
        debug!(subscriber = id, "feed subscriber disconnected");
    }

    /// Take everything queued for one subscriber.
    pub fn drain(&self, id: u64) -> Vec<FeedMessage> {
        self.subscribers
            .lock()
            .get_mut(&id)
            .map(|q| q.drain())
            .unwrap_or_default()
    }

    /// Queue a message for every subscriber.
    pub fn publish(&self, topic: String, payload: String) {
        let message = FeedMessage { topic, payload };
        let mut subscribers = self.subscribers.lock();
        let mut dropped = 0u64;
        for queue in subscribers.values_mut() {
            let before = queue.dropped;
            queue.enqueue(message.clone());
            dropped += queue.dropped - before;
        }
        drop(subscribers);

        self.published.fetch_add(1, Ordering::Relaxed);
        if dropped > 0 {
            self.dropped.fetch_add(dropped, Ordering::Relaxed);
        }
    }

    /// Recent public trades for one symbol, newest first.
    pub fn recent_public_trades(&self, symbol: &Symbol, count: usize) -> Vec<PublicTrade> {
        self.buffers
            .get(symbol)
            .map(|b| b.recent(count))
            .unwrap_or_default()
    }

    pub fn messages_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn messages_dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl TradeSink for FeedHub {
    fn on_trade(&self, trade: &Trade) {
        let public = self
            .buffers
            .entry(trade.symbol.clone())
            .or_insert_with(|| TradeBuffer::new(trade.symbol.clone(), self.trade_history))
            .record(trade);
        match serde_json::to_string(&public) {
            Ok(payload) => self.publish(topics::trades(&trade.symbol), payload),
            Err(err) => debug!(%err, "trade serialization failed"),
        }
    }
}

impl MarketDataSink for FeedHub {
    fn on_depth(&self, depth: &Depth) {
        let update = DepthUpdate::from_depth(depth, clock::wall_ns());
        match serde_json::to_string(&update) {
            Ok(payload) => self.publish(topics::depth(&depth.symbol), payload),
            Err(err) => debug!(%err, "depth serialization failed"),
        }
    }

    fn on_engine_status(&self, status: EngineStatus) {
        let payload = json!({ "engine": status }).to_string();
        self.publish(topics::STATUS.to_string(), payload);
    }

    fn on_halt(&self, symbol: Option<&Symbol>, reason: &str) {
        let payload = json!({
            "halt": symbol.map(|s| s.as_str()),
            "reason": reason,
        })
        .to_string();
        self.publish(topics::STATUS.to_string(), payload);
    }
}
