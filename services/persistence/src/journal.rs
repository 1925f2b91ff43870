//! Settlement journal writer
//!
//! Every recorded deal and every cancellation sweep is appended to an
//! append-only journal so the settlement history can be audited or replayed
//! independently of the store.
//!
//! # Binary Format (per entry)
//! ```text
//! [total_len: u32]
//! [sequence:  u64]
//! [timestamp: i64]   // unix millis
//! [event_type_len: u16][event_type: bytes]
//! [payload_len: u32][payload: bytes]   // bincode SettlementRecord
//! [checksum: u32]    // CRC32C over sequence+timestamp+event_type+payload
//! ```

use crc32c::crc32c;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use types::ids::{DealId, MatchId, OrderId, PairId, UnitId};

use crate::reader::JournalReader;

/// Smallest body: sequence, timestamp, two length fields and the checksum
const MIN_BODY_LEN: usize = 8 + 8 + 2 + 4 + 4;
const MAX_BODY_LEN: usize = 64 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Sequence error: expected {expected}, got {got}")]
    SequenceError { expected: u64, got: u64 },

    #[error("Checksum mismatch at byte offset {offset}: entry seq={sequence}")]
    ChecksumMismatch { offset: u64, sequence: u64 },
}

/// What the journal records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementRecord {
    DealRecorded {
        pair_id: PairId,
        deal_id: DealId,
        unit: UnitId,
        matches: Vec<(MatchId, Vec<OrderId>)>,
    },
    OrdersCancelled {
        pair_id: PairId,
        order_ids: Vec<OrderId>,
    },
}

impl SettlementRecord {
    pub fn event_type(&self) -> &'static str {
        match self {
            SettlementRecord::DealRecorded { .. } => "DealRecorded",
            SettlementRecord::OrdersCancelled { .. } => "OrdersCancelled",
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, JournalError> {
        bincode::serialize(self).map_err(|e| JournalError::Serialization(e.to_string()))
    }

    pub fn decode(payload: &[u8]) -> Result<Self, JournalError> {
        bincode::deserialize(payload).map_err(|e| JournalError::Serialization(e.to_string()))
    }
}

/// One framed journal entry
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub sequence: u64,
    pub timestamp: i64,
    pub event_type: String,
    pub payload: Vec<u8>,
    pub checksum: u32,
}

/// Cursor over an entry body that reports truncation instead of panicking.
struct Cursor<'a> {
    body: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], JournalError> {
        let end = self.pos.checked_add(len).filter(|&end| end <= self.body.len()).ok_or_else(|| {
            JournalError::Serialization(format!("truncated {} at body offset {}", what, self.pos))
        })?;
        let body: &'a [u8] = self.body;
        self.pos = end;
        Ok(&body[end - len..end])
    }

    fn array<const N: usize>(&mut self, what: &str) -> Result<[u8; N], JournalError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }
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

    pub fn compute_checksum(sequence: u64, timestamp: i64, event_type: &str, payload: &[u8]) -> u32 {
        let mut buf = Vec::with_capacity(16 + event_type.len() + payload.len());
        buf.extend_from_slice(&sequence.to_le_bytes());
        buf.extend_from_slice(&timestamp.to_le_bytes());
        buf.extend_from_slice(event_type.as_bytes());
        buf.extend_from_slice(payload);
        crc32c(&buf)
    }

    pub fn verify_checksum(&self) -> bool {
        self.checksum == Self::compute_checksum(self.sequence, self.timestamp, &self.event_type, &self.payload)
    }

    pub fn record(&self) -> Result<SettlementRecord, JournalError> {
        SettlementRecord::decode(&self.payload)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let event_type = self.event_type.as_bytes();
        let body_len = (MIN_BODY_LEN + event_type.len() + self.payload.len()) as u32;

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

    /// Decode one entry from the front of `data`; returns it with the bytes consumed.
    pub fn from_bytes(data: &[u8]) -> Result<(Self, usize), JournalError> {
        let mut head = Cursor { body: data, pos: 0 };
        let body_len = u32::from_le_bytes(head.array("length prefix")?) as usize;
        if !(MIN_BODY_LEN..=MAX_BODY_LEN).contains(&body_len) {
            return Err(JournalError::Serialization(format!("implausible body length {}", body_len)));
        }
        let body = head.take(body_len, "entry body")?;

        let mut cursor = Cursor { body, pos: 0 };
        let sequence = u64::from_le_bytes(cursor.array("sequence")?);
        let timestamp = i64::from_le_bytes(cursor.array("timestamp")?);
        let event_type_len = u16::from_le_bytes(cursor.array("event type length")?) as usize;
        let event_type = String::from_utf8(cursor.take(event_type_len, "event type")?.to_vec())
            .map_err(|e| JournalError::Serialization(e.to_string()))?;
        let payload_len = u32::from_le_bytes(cursor.array("payload length")?) as usize;
        let payload = cursor.take(payload_len, "payload")?.to_vec();
        let checksum = u32::from_le_bytes(cursor.array("checksum")?);

        let entry = Self {
            sequence,
            timestamp,
            event_type,
            payload,
            checksum,
        };
        Ok((entry, 4 + body_len))
    }
}

/// Append-only writer over a single journal file in `dir`.
pub struct JournalWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    next_sequence: u64,
}

impl JournalWriter {
    pub const FILE_NAME: &'static str = "settlements.journal";

    /// Open (or create) the journal in `dir`, continuing after its last entry.
    pub fn open(dir: &Path) -> Result<Self, JournalError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(Self::FILE_NAME);
        let last = if path.exists() {
            JournalReader::open(&path)?.read_all()?.last().map(|e| e.sequence)
        } else {
            None
        };
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            next_sequence: last.map_or(1, |seq| seq + 1),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Append a framed entry; its sequence must be the next one.
    pub fn append(&mut self, entry: &JournalEntry) -> Result<(), JournalError> {
        if entry.sequence != self.next_sequence {
            return Err(JournalError::SequenceError {
                expected: self.next_sequence,
                got: entry.sequence,
            });
        }
        self.writer.write_all(&entry.to_bytes())?;
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.next_sequence += 1;
        Ok(())
    }

    /// Frame and append `record` with the next sequence.
    pub fn write_record(&mut self, timestamp: i64, record: &SettlementRecord) -> Result<JournalEntry, JournalError> {
        let entry = JournalEntry::new(
            self.next_sequence,
            timestamp,
            record.event_type().to_string(),
            record.encode()?,
        );
        self.append(&entry)?;
        Ok(entry)
    }
}
