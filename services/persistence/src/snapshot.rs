//! Periodic snapshots
//!
//! Depth snapshots keyed by symbol plus per-user position snapshots,
//! written as JSON documents with a SHA-256 content checksum. Files
//! are replaced atomically (write-temp-then-rename).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use matching_engine::book::order_book::Depth;
use types::ids::Symbol;
use types::position::Position;

use crate::journal::JournalError;

/// A depth snapshot document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthDocument {
    pub depth: Depth,
    pub timestamp: i64,
    pub checksum: String,
}

/// A position snapshot document covering all users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionDocument {
    pub positions: Vec<Position>,
    pub timestamp: i64,
    pub checksum: String,
}

/// Writes snapshot documents into a directory.
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, JournalError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Replace the depth snapshot for one symbol.
    pub fn write_depth(&self, depth: &Depth, timestamp: i64) -> Result<(), JournalError> {
        let body = serde_json::to_string(depth).map_err(|e| JournalError::Frame(e.to_string()))?;
        let document = DepthDocument {
            depth: depth.clone(),
            timestamp,
            checksum: content_checksum(&body, timestamp),
        };
        self.replace(&self.depth_path(&depth.symbol), &document)
    }

    /// Replace the all-users position snapshot.
    pub fn write_positions(
        &self,
        positions: &[Position],
        timestamp: i64,
    ) -> Result<(), JournalError> {
        let body =
            serde_json::to_string(positions).map_err(|e| JournalError::Frame(e.to_string()))?;
        let document = PositionDocument {
            positions: positions.to_vec(),
            timestamp,
            checksum: content_checksum(&body, timestamp),
        };
        self.replace(&self.positions_path(), &document)
    }

    pub fn depth_path(&self, symbol: &Symbol) -> PathBuf {
        self.dir.join(format!("depth-{symbol}.json"))
    }

    pub fn positions_path(&self) -> PathBuf {
        self.dir.join("positions.json")
    }

    fn replace<T: Serialize>(&self, path: &Path, document: &T) -> Result<(), JournalError> {
        let json =
            serde_json::to_vec_pretty(document).map_err(|e| JournalError::Frame(e.to_string()))?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn content_checksum(body: &str, timestamp: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hasher.update(timestamp.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Recompute and compare a depth document's checksum.
pub fn verify_depth_document(document: &DepthDocument) -> bool {
    match serde_json::to_string(&document.depth) {
        Ok(body) => document.checksum == content_checksum(&body, document.timestamp),
        Err(_) => false,
    }
}
