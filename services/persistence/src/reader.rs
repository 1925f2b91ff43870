//! Journal reader
//!
//! Reads a settlement journal front to back, validating the CRC32C of every
//! entry and that sequences are gapless from 1.

use std::fs;
use std::path::Path;
use tracing::warn;

use crate::journal::{JournalEntry, JournalError, SettlementRecord};

pub struct JournalReader {
    data: Vec<u8>,
    pos: usize,
    last_sequence: u64,
}

impl JournalReader {
    pub fn open(path: &Path) -> Result<Self, JournalError> {
        Ok(Self::from_bytes(fs::read(path)?))
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data,
            pos: 0,
            last_sequence: 0,
        }
    }

    /// Byte offset of the next unread entry
    pub fn offset(&self) -> u64 {
        self.pos as u64
    }

    /// Next valid entry, or `None` at the end of the journal.
    pub fn next_entry(&mut self) -> Result<Option<JournalEntry>, JournalError> {
        if self.pos >= self.data.len() {
            return Ok(None);
        }
        let offset = self.offset();
        let (entry, consumed) = JournalEntry::from_bytes(&self.data[self.pos..])?;
        if !entry.verify_checksum() {
            warn!(offset, sequence = entry.sequence, "journal checksum mismatch");
            return Err(JournalError::ChecksumMismatch {
                offset,
                sequence: entry.sequence,
            });
        }
        let expected = self.last_sequence + 1;
        if entry.sequence != expected {
            return Err(JournalError::SequenceError {
                expected,
                got: entry.sequence,
            });
        }
        self.pos += consumed;
        self.last_sequence = entry.sequence;
        Ok(Some(entry))
    }

    pub fn read_all(&mut self) -> Result<Vec<JournalEntry>, JournalError> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next_entry()? {
            entries.push(entry);
        }
        Ok(entries)
    }
}

/// Decode every record of the journal at `path`, in sequence order.
pub fn replay(path: &Path) -> Result<Vec<(u64, SettlementRecord)>, JournalError> {
    JournalReader::open(path)?
        .read_all()?
        .into_iter()
        .map(|entry| Ok((entry.sequence, entry.record()?)))
        .collect()
}
