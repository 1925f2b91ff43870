//! In-process ledger
//!
//! A single-node stand-in for the ledger network: it keeps transaction
//! outputs, the spent set, registered escrows and the stability index in
//! memory. Composition enforces the same rules the network would: inputs
//! must exist and be unspent, every asset must cover its outputs, and every
//! paying escrow must be satisfied through the operator's settle branch.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};
use types::asset::Asset;
use types::escrow::{EscrowDefinition, EscrowSigner, SigningPath};
use types::ids::{Address, DeviceAddress, OutputRef, UnitId};
use types::numeric::Amount;

use crate::errors::{ComposeError, LedgerError};
use crate::escrow::{authorizing_path, verify_address, SpendOutput};
use crate::ledger::{ComposedTransfer, Ledger, LedgerOutput, Payment, TransferRequest, MAX_AUTHORS_PER_UNIT};

/// Flat network fee charged on every composed transfer
pub const NETWORK_FEE: Amount = 500;

#[derive(Debug, Clone)]
struct RegisteredEscrow {
    definition: EscrowDefinition,
    signers: Vec<EscrowSigner>,
}

#[derive(Default)]
struct LedgerState {
    units: HashMap<UnitId, Vec<LedgerOutput>>,
    spent: HashSet<OutputRef>,
    escrows: HashMap<Address, RegisteredEscrow>,
    stable_by_mci: BTreeMap<u64, Vec<UnitId>>,
    last_mci: u64,
    operator_stable: bool,
    composed: Vec<TransferRequest>,
    broadcasts: Vec<UnitId>,
    next_unit: u64,
    fail_next_compose: Option<ComposeError>,
}

impl LedgerState {
    fn mint_unit(&mut self, seed: &[u8]) -> UnitId {
        self.next_unit += 1;
        let mut hasher = Sha256::new();
        hasher.update(self.next_unit.to_be_bytes());
        hasher.update(seed);
        UnitId::new(hex::encode(hasher.finalize()))
    }

    fn lookup(&self, output: &OutputRef) -> Option<&LedgerOutput> {
        self.units.get(&output.unit)?.iter().find(|o| &o.output == output)
    }

    /// Store outputs grouped into one message per asset, base first.
    fn record_unit(&mut self, unit: UnitId, payments: Vec<(Asset, Payment)>) {
        let mut by_asset: BTreeMap<Asset, Vec<Payment>> = BTreeMap::new();
        for (asset, payment) in payments {
            by_asset.entry(asset).or_default().push(payment);
        }
        let mut outputs = Vec::new();
        for (message_index, (asset, payments)) in by_asset.into_iter().enumerate() {
            for (output_index, payment) in payments.into_iter().enumerate() {
                outputs.push(LedgerOutput {
                    output: OutputRef::new(unit.clone(), message_index as u32, output_index as u32),
                    address: payment.address,
                    asset: asset.clone(),
                    amount: payment.amount,
                });
            }
        }
        self.units.insert(unit, outputs);
    }
}

pub struct MemoryLedger {
    operator: Address,
    device: DeviceAddress,
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    pub fn new(operator: Address, device: DeviceAddress) -> Self {
        Self {
            operator,
            device,
            state: Mutex::new(LedgerState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn operator(&self) -> &Address {
        &self.operator
    }

    /// Record an external payment and return its unit.
    pub fn submit_payment(&self, outputs: Vec<(Address, Asset, Amount)>) -> UnitId {
        let mut state = self.state();
        let seed = format!("{:?}", outputs);
        let unit = state.mint_unit(seed.as_bytes());
        let payments = outputs
            .into_iter()
            .map(|(address, asset, amount)| (asset, Payment { address, amount }))
            .collect();
        state.record_unit(unit.clone(), payments);
        debug!(unit = %unit, "payment submitted");
        unit
    }

    /// Make `units` final at the next main chain index and return that index.
    pub fn stabilize(&self, units: &[UnitId]) -> u64 {
        let mut state = self.state();
        state.last_mci += 1;
        let mci = state.last_mci;
        state.stable_by_mci.insert(mci, units.to_vec());
        mci
    }

    /// Spend an output outside the exchange, as an owner reclaiming after expiry would.
    pub fn spend_elsewhere(&self, output: &OutputRef) {
        self.state().spent.insert(output.clone());
    }

    /// The operator's own address authored a stable transaction.
    pub fn mark_operator_stable(&self) {
        self.state().operator_stable = true;
    }

    /// Make the next composition fail with `error`.
    pub fn fail_next_compose(&self, error: ComposeError) {
        self.state().fail_next_compose = Some(error);
    }

    pub fn broadcasts(&self) -> Vec<UnitId> {
        self.state().broadcasts.clone()
    }

    pub fn composed(&self) -> Vec<TransferRequest> {
        self.state().composed.clone()
    }

    pub fn escrow(&self, address: &Address) -> Option<EscrowDefinition> {
        self.state().escrows.get(address).map(|e| e.definition.clone())
    }

    pub fn escrow_signers(&self, address: &Address) -> Vec<EscrowSigner> {
        self.state()
            .escrows
            .get(address)
            .map(|e| e.signers.clone())
            .unwrap_or_default()
    }

    /// Unspent balance of `address` in `asset`.
    pub fn balance(&self, address: &Address, asset: &Asset) -> Amount {
        let state = self.state();
        state
            .units
            .values()
            .flatten()
            .filter(|o| &o.address == address && &o.asset == asset && !state.spent.contains(&o.output))
            .map(|o| o.amount)
            .sum()
    }
}

fn sum_inputs(
    state: &LedgerState,
    inputs: &[OutputRef],
    asset: &Asset,
    paying: &HashSet<&Address>,
) -> Result<Amount, ComposeError> {
    let mut total: Amount = 0;
    for input in inputs {
        let output = state
            .lookup(input)
            .ok_or_else(|| ComposeError::Compose(format!("unknown input {}", input)))?;
        if state.spent.contains(input) {
            return Err(ComposeError::Compose(format!("input {} already spent", input)));
        }
        if &output.asset != asset {
            return Err(ComposeError::Compose(format!("input {} is not {}", input, asset)));
        }
        if !paying.contains(&output.address) {
            return Err(ComposeError::Compose(format!(
                "input {} owned by non-paying address {}",
                input, output.address
            )));
        }
        total = total
            .checked_add(output.amount)
            .ok_or_else(|| ComposeError::Compose(format!("{} input overflow", asset)))?;
    }
    Ok(total)
}

fn sum_payments(payments: &[Payment]) -> Amount {
    payments.iter().map(|p| p.amount).sum()
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn outputs(&self, unit: &UnitId) -> Result<Vec<LedgerOutput>, LedgerError> {
        self.state()
            .units
            .get(unit)
            .cloned()
            .ok_or_else(|| LedgerError::UnknownUnit(unit.clone()))
    }

    async fn units_stabilized_at(&self, mci: u64) -> Result<Vec<UnitId>, LedgerError> {
        Ok(self.state().stable_by_mci.get(&mci).cloned().unwrap_or_default())
    }

    async fn spent_outputs(&self, outputs: &[OutputRef]) -> Result<HashSet<OutputRef>, LedgerError> {
        let state = self.state();
        Ok(outputs.iter().filter(|o| state.spent.contains(o)).cloned().collect())
    }

    async fn register_escrow(
        &self,
        address: &Address,
        definition: &EscrowDefinition,
        signers: &[EscrowSigner],
    ) -> Result<(), LedgerError> {
        verify_address(address, definition)?;
        let mut state = self.state();
        if let Some(existing) = state.escrows.get(address) {
            if &existing.definition != definition {
                return Err(LedgerError::AddressInUse(address.clone()));
            }
            return Ok(());
        }
        state.escrows.insert(
            address.clone(),
            RegisteredEscrow {
                definition: definition.clone(),
                signers: signers.to_vec(),
            },
        );
        Ok(())
    }

    async fn compose_and_sign(&self, request: TransferRequest) -> Result<ComposedTransfer, ComposeError> {
        let mut state = self.state();
        if let Some(error) = state.fail_next_compose.take() {
            return Err(error);
        }
        if request.paying_addresses.len() > MAX_AUTHORS_PER_UNIT {
            return Err(ComposeError::Compose(format!(
                "{} authors exceed the limit of {}",
                request.paying_addresses.len(),
                MAX_AUTHORS_PER_UNIT
            )));
        }
        if request.signing_path != SigningPath::Operator {
            return Err(ComposeError::Compose("exchange transfers sign on the operator path".to_string()));
        }
        let paying: HashSet<&Address> = request.paying_addresses.iter().collect();

        let base_in = sum_inputs(&state, &request.base_inputs, &Asset::Base, &paying)?;
        let base_out = sum_payments(&request.base_outputs);
        let change = base_in
            .checked_sub(base_out)
            .and_then(|rest| rest.checked_sub(NETWORK_FEE))
            .ok_or_else(|| {
                ComposeError::NotEnoughFunds(format!(
                    "base inputs {} cannot cover outputs {} and fee {}",
                    base_in, base_out, NETWORK_FEE
                ))
            })?;

        for message in &request.messages {
            let asset = Asset::Issued(message.asset.clone());
            let inputs = sum_inputs(&state, &message.inputs, &asset, &paying)?;
            let outputs = sum_payments(&message.outputs);
            if outputs > inputs {
                return Err(ComposeError::NotEnoughFunds(format!(
                    "{} inputs {} cannot cover outputs {}",
                    asset, inputs, outputs
                )));
            }
        }

        let mut base_outputs = request.base_outputs.clone();
        let first = base_outputs
            .first_mut()
            .ok_or_else(|| ComposeError::Compose("no change output".to_string()))?;
        first.amount += change;

        let mut payments: Vec<(Asset, Payment)> =
            base_outputs.iter().cloned().map(|p| (Asset::Base, p)).collect();
        for message in &request.messages {
            let asset = Asset::Issued(message.asset.clone());
            payments.extend(message.outputs.iter().cloned().map(|p| (asset.clone(), p)));
        }

        let spend: Vec<SpendOutput<'_>> = payments
            .iter()
            .map(|(asset, p)| SpendOutput {
                asset,
                address: &p.address,
                amount: p.amount,
            })
            .collect();
        for author in &request.paying_addresses {
            let escrow = state
                .escrows
                .get(author)
                .ok_or_else(|| ComposeError::Compose(format!("{} is not a registered escrow", author)))?;
            if authorizing_path(&escrow.definition, &self.operator, None, &spend) != Some(SigningPath::Operator) {
                return Err(ComposeError::Compose(format!("escrow condition of {} not satisfied", author)));
            }
        }

        let seed = serde_json::to_vec(&request).map_err(|e| ComposeError::Compose(e.to_string()))?;
        let unit = state.mint_unit(&seed);
        let consumed: Vec<OutputRef> = request
            .base_inputs
            .iter()
            .chain(request.messages.iter().flat_map(|m| m.inputs.iter()))
            .cloned()
            .collect();
        state.spent.extend(consumed);
        state.record_unit(unit.clone(), payments);
        state.composed.push(request.clone());

        info!(unit = %unit, authors = request.paying_addresses.len(), change, "transfer composed");
        Ok(ComposedTransfer {
            unit,
            authors: request.paying_addresses,
        })
    }

    async fn broadcast(&self, unit: &UnitId) -> Result<(), LedgerError> {
        let mut state = self.state();
        if !state.units.contains_key(unit) {
            return Err(LedgerError::UnknownUnit(unit.clone()));
        }
        state.broadcasts.push(unit.clone());
        Ok(())
    }

    async fn stable_operator_address(&self) -> Result<Option<Address>, LedgerError> {
        Ok(self.state().operator_stable.then(|| self.operator.clone()))
    }

    fn device_address(&self) -> DeviceAddress {
        self.device.clone()
    }
}
