//! Order book persistence
//!
//! The logical schema (`pairs`, `expected_deposits`, `orders`, `deals`,
//! `matches`) behind the [`store::ExchangeStore`] trait, an in-memory
//! implementation, and an append-only settlement journal.
//!
//! # Guarantees
//! - Surrogate ids are assigned by the store, monotonically, per table
//! - Settlement recording is all-or-nothing: a deal is written only if
//!   every order it fills is still active
//! - Journal entries are CRC32C-checked and gapless in sequence

pub mod journal;
pub mod memory;
pub mod reader;
pub mod store;

pub use journal::{JournalWriter, SettlementRecord};
pub use memory::MemoryStore;
pub use store::{ExchangeStore, StoreError};
