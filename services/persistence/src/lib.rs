//! Persistence Service
//!
//! Write-only sinks for the matching engine: an append-only,
//! checksummed event journal and periodic depth/position snapshots.
//! Recovery from these artifacts is owned by downstream tooling, not
//! this process.

pub mod journal;
pub mod snapshot;
pub mod writer;

pub use journal::{JournalEntry, JournalError, JournalWriter};
pub use snapshot::SnapshotWriter;
pub use writer::StorageWriter;
