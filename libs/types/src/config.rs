//! Engine configuration
//!
//! Every field has a default so a partial file (or none at all) yields a
//! runnable engine.

use crate::risk::{BreakerLimits, RiskLimits};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration consumed by the gateway binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub risk: RiskConfig,
    pub breaker: BreakerLimits,
    pub network: NetworkConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().display().to_string(), e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {0}: {1}")]
    Io(String, String),

    #[error("cannot parse config: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of matching worker threads.
    pub processing_threads: usize,
    /// Ingress queue capacity; rounded up to a power of two.
    pub queue_size: usize,
    /// Instruments the engine trades.
    pub instruments: Vec<String>,
    /// Depth levels reported by default.
    pub depth_levels: usize,
    /// Capacity of each book's recent-trades ring.
    pub recent_trades_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            processing_threads: 2,
            queue_size: 100_000,
            instruments: vec!["AAPL".to_string()],
            depth_levels: 10,
            recent_trades_capacity: 1_000,
        }
    }
}

/// Risk defaults applied to every user unless overridden at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub default_limits: RiskLimits,
    /// Equity assigned to a user on first sight, for drawdown math.
    pub starting_equity: rust_decimal::Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            default_limits: RiskLimits::default(),
            starting_equity: rust_decimal::Decimal::from(1_000_000),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Legacy text request/reply listener.
    pub text_endpoint: String,
    /// JSON API listener.
    pub api_endpoint: String,
    /// Market-data feed listener.
    pub feed_endpoint: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            text_endpoint: "127.0.0.1:5555".to_string(),
            api_endpoint: "127.0.0.1:8080".to_string(),
            feed_endpoint: "127.0.0.1:5556".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub journal_dir: String,
    pub snapshot_dir: String,
    /// Rotate journal segments beyond this size.
    pub journal_max_bytes: u64,
    /// Seconds between depth/position snapshots.
    pub snapshot_interval_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            journal_dir: "data/journal".to_string(),
            snapshot_dir: "data/snapshots".to_string(),
            journal_max_bytes: 64 * 1024 * 1024,
            snapshot_interval_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.engine.processing_threads, 2);
        assert_eq!(config.engine.queue_size, 100_000);
        assert_eq!(config.engine.recent_trades_capacity, 1_000);
        assert_eq!(config.network.text_endpoint, "127.0.0.1:5555");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"engine": {"processing_threads": 8}}"#).unwrap();
        assert_eq!(config.engine.processing_threads, 8);
        assert_eq!(config.engine.queue_size, 100_000);
        assert_eq!(config.network.api_endpoint, "127.0.0.1:8080");
    }

    #[test]
    fn test_instruments_parse() {
        let config: AppConfig = serde_json::from_str(
            r#"{"engine": {"instruments": ["AAPL", "MSFT", "BTC-USD"]}}"#,
        )
        .unwrap();
        assert_eq!(config.engine.instruments.len(), 3);
    }
}
