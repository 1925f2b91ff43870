//! Ledger notifications
//!
//! The ledger node pushes two kinds of events to the exchange: new
//! transactions touching its addresses, and advancement of the stability
//! point. Both are plain records; the gateway's event loop dispatches them.

use serde::{Deserialize, Serialize};
use types::ids::UnitId;

/// Event delivered by the ledger node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// Transactions paying to watched addresses, not yet final
    NewTransactions { units: Vec<UnitId> },
    /// Units at main chain index `mci` became irreversible
    Stabilized { mci: u64 },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::NewTransactions { .. } => "new_transactions",
            LedgerEvent::Stabilized { .. } => "stabilized",
        }
    }
}
