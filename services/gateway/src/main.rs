//! Matching engine gateway
//!
//! Wires the engine, risk, market-data, and persistence services
//! together and serves the three client surfaces: the legacy text
//! protocol, the JSON API, and the pub/sub feed.

mod error;
mod feed;
mod handlers;
mod models;
mod responses;
mod router;
mod state;
mod text;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use market_data::FeedHub;
use matching_engine::{clock, Engine, EngineSinks};
use persistence::{SnapshotWriter, StorageWriter};
use risk_engine::RiskEngine;
use types::config::AppConfig;
use types::ids::Symbol;

use responses::ResponseRouter;
use state::AppState;

const FEED_QUEUE_CAPACITY: usize = 4_096;
const RESPONSE_WINDOW_CAPACITY: usize = 100_000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config();
    info!(
        instruments = config.engine.instruments.len(),
        threads = config.engine.processing_threads,
        "starting matching gateway"
    );

    // Sinks.
    let hub = Arc::new(FeedHub::new(
        FEED_QUEUE_CAPACITY,
        config.engine.recent_trades_capacity,
    ));
    let storage = StorageWriter::spawn(&config.storage)?;
    let responses = Arc::new(ResponseRouter::new(RESPONSE_WINDOW_CAPACITY));

    let sinks = EngineSinks::new()
        .add_response_sink(responses.clone())
        .add_response_sink(storage.clone())
        .add_trade_sink(hub.clone())
        .add_trade_sink(storage.clone())
        .add_market_data_sink(hub.clone());

    // Core services.
    let risk = Arc::new(RiskEngine::new(&config.risk, config.breaker.clone()));
    let engine = Engine::new(config.engine.clone(), Arc::clone(&risk), sinks);
    engine.start();

    let default_symbol = engine
        .symbols()
        .into_iter()
        .next()
        .unwrap_or_else(|| Symbol::new("AAPL"));
    let app_state = AppState {
        engine: Arc::clone(&engine),
        responses,
        hub: Arc::clone(&hub),
        default_symbol,
        depth_levels: config.engine.depth_levels,
    };

    // Periodic depth and position snapshots.
    let snapshots = SnapshotWriter::open(&config.storage.snapshot_dir)?;
    let snapshot_engine = Arc::clone(&engine);
    let snapshot_risk = Arc::clone(&risk);
    let snapshot_interval = Duration::from_secs(config.storage.snapshot_interval_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(snapshot_interval);
        loop {
            ticker.tick().await;
            let now = clock::wall_ns();
            for symbol in snapshot_engine.symbols() {
                if let Some(depth) = snapshot_engine.depth(&symbol, usize::MAX) {
                    if let Err(err) = snapshots.write_depth(&depth, now) {
                        warn!(%err, %symbol, "depth snapshot failed");
                    }
                }
            }
            if let Err(err) = snapshots.write_positions(&snapshot_risk.all_positions(), now) {
                warn!(%err, "position snapshot failed");
            }
        }
    });

    // Client surfaces.
    let text_state = app_state.clone();
    let text_endpoint = config.network.text_endpoint.clone();
    tokio::spawn(async move {
        if let Err(err) = text::serve(&text_endpoint, text_state).await {
            error!(%err, "text protocol listener failed");
        }
    });

    let feed_hub = Arc::clone(&hub);
    let feed_endpoint = config.network.feed_endpoint.clone();
    tokio::spawn(async move {
        if let Err(err) = feed::serve(&feed_endpoint, feed_hub).await {
            error!(%err, "feed listener failed");
        }
    });

    let app = router::create_router(app_state);
    let listener = TcpListener::bind(&config.network.api_endpoint).await?;
    info!(endpoint = %config.network.api_endpoint, "api listening");

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(err) = result {
                error!(%err, "api server failed");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    engine.stop();
    storage.shutdown();
    info!("gateway stopped");
    Ok(())
}

/// First CLI argument names the config file; defaults apply otherwise.
fn load_config() -> AppConfig {
    match std::env::args().nth(1) {
        Some(path) => match AppConfig::from_file(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(%err, path, "config load failed, using defaults");
                AppConfig::default()
            }
        },
        None => AppConfig::default(),
    }
}
