//! Operator context
//!
//! The operator address is known only once the node has authored a stable,
//! well-formed transaction. It is resolved lazily, set once, and then
//! passed to intake and settlement by reference.

use contracts::errors::LedgerError;
use contracts::ledger::Ledger;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::info;
use types::ids::{Address, DeviceAddress};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorContext {
    /// Co-signer of every escrow's settle branch
    pub operator_address: Address,
    /// Receives change, spread and header commissions of settlements
    pub fee_address: Address,
    pub device_address: DeviceAddress,
}

/// Set-once holder of the [`OperatorContext`]
#[derive(Debug, Default)]
pub struct OperatorCell {
    cell: OnceCell<OperatorContext>,
}

impl OperatorCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cell that is already resolved.
    pub fn resolved(context: OperatorContext) -> Self {
        Self {
            cell: OnceCell::new_with(Some(context)),
        }
    }

    pub fn get(&self) -> Option<&OperatorContext> {
        self.cell.get()
    }

    /// Resolve from the ledger unless already resolved. `None` while the
    /// ledger has no stable transaction of ours yet.
    pub async fn resolve(&self, ledger: &dyn Ledger) -> Result<Option<&OperatorContext>, LedgerError> {
        if let Some(context) = self.cell.get() {
            return Ok(Some(context));
        }
        let Some(address) = ledger.stable_operator_address().await? else {
            info!("no stable operator transaction yet");
            return Ok(None);
        };
        let context = OperatorContext {
            operator_address: address.clone(),
            fee_address: address,
            device_address: ledger.device_address(),
        };
        if self.cell.set(context).is_ok() {
            if let Some(context) = self.cell.get() {
                info!(operator = %context.operator_address, "operator address resolved");
            }
        }
        Ok(self.cell.get())
    }
}
