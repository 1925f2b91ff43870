//! Escrow custody and settlement
//!
//! Everything the exchange needs from the ledger side: deriving and checking
//! custody addresses, the ledger collaborator interface, and turning matches
//! into one balanced multi-party transfer.
//!
//! # Modules
//! - `errors`: Escrow, ledger and composer errors
//! - `escrow`: Custody address derivation and the escrow spending condition
//! - `ledger`: Ledger collaborator trait and transfer shapes
//! - `settlement`: Match to transfer planning with balance invariants
//! - `events`: Notifications pushed by the ledger node
//! - `memory_ledger`: In-process ledger used by tests and local runs

pub mod errors;
pub mod escrow;
pub mod events;
pub mod ledger;
pub mod memory_ledger;
pub mod settlement;

/// Version of the escrow definition layout; changing it changes every address
pub const ESCROW_LAYOUT_VERSION: &str = "1.0.0";
