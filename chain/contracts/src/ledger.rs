//! Ledger collaborator interface
//!
//! The ledger network provides custody, signing, transaction composition and
//! broadcast. The exchange consumes it only through the [`Ledger`] trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use types::asset::{Asset, AssetId};
use types::escrow::{EscrowDefinition, EscrowSigner, SigningPath};
use types::ids::{Address, DeviceAddress, OutputRef, UnitId};
use types::numeric::Amount;

use crate::errors::{ComposeError, LedgerError};

/// Hard protocol limit on distinct authors of one transaction
pub const MAX_AUTHORS_PER_UNIT: usize = 16;

/// An output of a ledger transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerOutput {
    pub output: OutputRef,
    pub address: Address,
    pub asset: Asset,
    pub amount: Amount,
}

/// An output to be created by a transfer
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Payment {
    pub address: Address,
    pub amount: Amount,
}

/// Inputs and outputs of one issued asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMessage {
    pub asset: AssetId,
    pub inputs: Vec<OutputRef>,
    pub outputs: Vec<Payment>,
}

/// Multi-party transfer handed to the composer.
///
/// The first base output is the change output; the composer fills its amount
/// with whatever base value remains after outputs and network fees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub paying_addresses: Vec<Address>,
    pub base_inputs: Vec<OutputRef>,
    pub base_input_amount: Amount,
    pub base_outputs: Vec<Payment>,
    pub messages: Vec<PaymentMessage>,
    pub commission_recipient: Address,
    pub signing_path: SigningPath,
}

/// Result of a successful composition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedTransfer {
    pub unit: UnitId,
    pub authors: Vec<Address>,
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Outputs of a transaction.
    async fn outputs(&self, unit: &UnitId) -> Result<Vec<LedgerOutput>, LedgerError>;

    /// Units that reached irreversible finality at main chain index `mci`.
    async fn units_stabilized_at(&self, mci: u64) -> Result<Vec<UnitId>, LedgerError>;

    /// Subset of `outputs` already consumed by some transaction.
    async fn spent_outputs(&self, outputs: &[OutputRef]) -> Result<HashSet<OutputRef>, LedgerError>;

    /// Register an escrow address with its definition and signers.
    async fn register_escrow(
        &self,
        address: &Address,
        definition: &EscrowDefinition,
        signers: &[EscrowSigner],
    ) -> Result<(), LedgerError>;

    /// Compose and sign a transfer on behalf of every paying escrow.
    async fn compose_and_sign(&self, request: TransferRequest) -> Result<ComposedTransfer, ComposeError>;

    async fn broadcast(&self, unit: &UnitId) -> Result<(), LedgerError>;

    /// First own address that authored a stable, well-formed transaction.
    async fn stable_operator_address(&self) -> Result<Option<Address>, LedgerError>;

    /// Messaging device of this node.
    fn device_address(&self) -> DeviceAddress;
}
