//! Background storage writer
//!
//! The matching path hands events to a bounded channel and moves on; a
//! dedicated thread serializes and appends them to the journal. A full
//! channel or a failed write is logged and counted, never propagated —
//! losing a journal entry must not stall matching.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{bounded, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{error, warn};

use matching_engine::clock;
use matching_engine::{ResponseSink, TradeSink};
use types::config::StorageConfig;
use types::order::OrderResponse;
use types::trade::Trade;

use crate::journal::{JournalError, JournalWriter};

const CHANNEL_CAPACITY: usize = 65_536;
const ORDER_EVENT: &str = "order";
const TRADE_EVENT: &str = "trade";

enum Message {
    Order(OrderResponse),
    Trade(Trade),
    Shutdown,
}

/// Non-blocking storage sink backed by a writer thread.
pub struct StorageWriter {
    tx: Sender<Message>,
    dropped: AtomicU64,
    written: Arc<AtomicU64>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl StorageWriter {
    /// Open the journal and spawn the writer thread.
    pub fn spawn(config: &StorageConfig) -> Result<Arc<Self>, JournalError> {
        let mut journal = JournalWriter::open(&config.journal_dir, config.journal_max_bytes)?;
        let (tx, rx) = bounded::<Message>(CHANNEL_CAPACITY);
        let written = Arc::new(AtomicU64::new(0));

        let written_in_thread = Arc::clone(&written);
        let handle = std::thread::spawn(move || {
            while let Ok(message) = rx.recv() {
                let result = match &message {
                    Message::Order(response) => append_json(&mut journal, ORDER_EVENT, response),
                    Message::Trade(trade) => append_json(&mut journal, TRADE_EVENT, trade),
                    Message::Shutdown => break,
                };
                match result {
                    Ok(()) => {
                        written_in_thread.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(err) => error!(%err, "journal append failed"),
                }
            }
            if let Err(err) = journal.flush() {
                error!(%err, "journal flush failed on shutdown");
            }
        });

        Ok(Arc::new(Self {
            tx,
            dropped: AtomicU64::new(0),
            written,
            handle: Mutex::new(Some(handle)),
        }))
    }

    /// Flush and join the writer thread. Queued events are written
    /// before the shutdown marker is honored.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Message::Shutdown);
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }

    pub fn events_written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    pub fn events_dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn enqueue(&self, message: Message) {
        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped.is_power_of_two() {
                    warn!(dropped, "storage channel full, dropping events");
                }
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

impl ResponseSink for StorageWriter {
    fn on_response(&self, response: &OrderResponse) {
        self.enqueue(Message::Order(response.clone()));
    }
}

impl TradeSink for StorageWriter {
    fn on_trade(&self, trade: &Trade) {
        self.enqueue(Message::Trade(trade.clone()));
    }
}

fn append_json<T: serde::Serialize>(
    journal: &mut JournalWriter,
    event_type: &str,
    value: &T,
) -> Result<(), JournalError> {
    let payload = serde_json::to_vec(value).map_err(|e| JournalError::Frame(e.to_string()))?;
    journal.append(event_type, &payload, clock::wall_ns())?;
    Ok(())
}
