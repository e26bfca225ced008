//! Append-only event journal
//!
//! Order and trade events are framed with a length prefix and a CRC32C
//! checksum and appended to size-rotated segment files. The journal is
//! a write-only sink; nothing in this process reads it back except
//! integrity tests.
//!
//! # Frame layout
//! ```text
//! [body_len:   u32]
//! [sequence:   u64]
//! [timestamp:  i64]
//! [event_type_len: u16][event_type bytes]
//! [payload_len:    u32][payload bytes]
//! [checksum:   u32]   CRC32C over sequence..payload
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crc32c::crc32c;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("journal io error: {0}")]
    Io(#[from] io::Error),

    #[error("journal frame error: {0}")]
    Frame(String),
}

/// One framed event.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub sequence: u64,
    pub timestamp: i64,
    pub event_type: String,
    pub payload: Vec<u8>,
    pub checksum: u32,
}

impl JournalEntry {
    pub fn new(sequence: u64, timestamp: i64, event_type: String, payload: Vec<u8>) -> Self {
        let checksum = Self::compute_checksum(sequence, timestamp, &event_type, &payload);
        Self {
            sequence,
            timestamp,
            event_type,
            payload,
            checksum,
        }
    }

    fn compute_checksum(sequence: u64, timestamp: i64, event_type: &str, payload: &[u8]) -> u32 {
        let mut buf = Vec::with_capacity(16 + event_type.len() + payload.len());
        buf.extend_from_slice(&sequence.to_le_bytes());
        buf.extend_from_slice(&timestamp.to_le_bytes());
        buf.extend_from_slice(event_type.as_bytes());
        buf.extend_from_slice(payload);
        crc32c(&buf)
    }

    pub fn verify_checksum(&self) -> bool {
        self.checksum
            == Self::compute_checksum(self.sequence, self.timestamp, &self.event_type, &self.payload)
    }

    /// Serialize to the binary frame.
    pub fn to_bytes(&self) -> Vec<u8> {
        let event_type = self.event_type.as_bytes();
        let body_len: u32 =
            8 + 8 + 2 + event_type.len() as u32 + 4 + self.payload.len() as u32 + 4;

        let mut buf = Vec::with_capacity(4 + body_len as usize);
        buf.extend_from_slice(&body_len.to_le_bytes());
        buf.extend_from_slice(&self.sequence.to_le_bytes());
        buf.extend_from_slice(&self.timestamp.to_le_bytes());
        buf.extend_from_slice(&(event_type.len() as u16).to_le_bytes());
        buf.extend_from_slice(event_type);
        buf.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.payload);
        buf.extend_from_slice(&self.checksum.to_le_bytes());
        buf
    }

    /// Parse one frame; returns the entry and bytes consumed.
    pub fn from_bytes(data: &[u8]) -> Result<(Self, usize), JournalError> {
        if data.len() < 4 {
            return Err(JournalError::Frame("short length prefix".into()));
        }
        let body_len = u32::from_le_bytes(data[0..4].try_into().expect("4 bytes")) as usize;
        if body_len > 100_000_000 {
            return Err(JournalError::Frame(format!(
                "implausible frame length {body_len}"
            )));
        }
        let total = 4 + body_len;
        if data.len() < total {
            return Err(JournalError::Frame(format!(
                "incomplete frame: need {total}, have {}",
                data.len()
            )));
        }

        let mut at = 4;
        let sequence = u64::from_le_bytes(data[at..at + 8].try_into().expect("8 bytes"));
        at += 8;
        let timestamp = i64::from_le_bytes(data[at..at + 8].try_into().expect("8 bytes"));
        at += 8;
        let type_len = u16::from_le_bytes(data[at..at + 2].try_into().expect("2 bytes")) as usize;
        at += 2;
        if at + type_len > total {
            return Err(JournalError::Frame("event type overruns frame".into()));
        }
        let event_type = String::from_utf8(data[at..at + type_len].to_vec())
            .map_err(|e| JournalError::Frame(e.to_string()))?;
        at += type_len;
        let payload_len =
            u32::from_le_bytes(data[at..at + 4].try_into().expect("4 bytes")) as usize;
        at += 4;
        if at + payload_len + 4 > total {
            return Err(JournalError::Frame("payload overruns frame".into()));
        }
        let payload = data[at..at + payload_len].to_vec();
        at += payload_len;
        let checksum = u32::from_le_bytes(data[at..at + 4].try_into().expect("4 bytes"));

        let entry = Self {
            sequence,
            timestamp,
            event_type,
            payload,
            checksum,
        };
        if !entry.verify_checksum() {
            return Err(JournalError::Frame(format!(
                "checksum mismatch at sequence {sequence}"
            )));
        }
        Ok((entry, total))
    }
}

/// Appends framed events to size-rotated segment files.
pub struct JournalWriter {
    dir: PathBuf,
    file: BufWriter<File>,
    segment: u64,
    bytes_written: u64,
    max_segment_bytes: u64,
    sequence: u64,
}

impl JournalWriter {
    pub fn open(dir: impl AsRef<Path>, max_segment_bytes: u64) -> Result<Self, JournalError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let segment = 0;
        let file = Self::open_segment(&dir, segment)?;
        Ok(Self {
            dir,
            file,
            segment,
            bytes_written: 0,
            max_segment_bytes,
            sequence: 0,
        })
    }

    fn open_segment(dir: &Path, segment: u64) -> Result<BufWriter<File>, JournalError> {
        let path = dir.join(format!("journal-{segment:06}.log"));
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(BufWriter::new(file))
    }

    /// Append one event; returns its journal sequence.
    pub fn append(
        &mut self,
        event_type: &str,
        payload: &[u8],
        timestamp: i64,
    ) -> Result<u64, JournalError> {
        self.sequence += 1;
        let entry = JournalEntry::new(
            self.sequence,
            timestamp,
            event_type.to_string(),
            payload.to_vec(),
        );
        let bytes = entry.to_bytes();

        if self.bytes_written + bytes.len() as u64 > self.max_segment_bytes {
            self.rotate()?;
        }
        self.file.write_all(&bytes)?;
        self.bytes_written += bytes.len() as u64;
        Ok(self.sequence)
    }

    pub fn flush(&mut self) -> Result<(), JournalError> {
        self.file.flush()?;
        Ok(())
    }

    fn rotate(&mut self) -> Result<(), JournalError> {
        self.file.flush()?;
        self.segment += 1;
        self.file = Self::open_segment(&self.dir, self.segment)?;
        self.bytes_written = 0;
        Ok(())
    }

    pub fn current_segment(&self) -> u64 {
        self.segment
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}
