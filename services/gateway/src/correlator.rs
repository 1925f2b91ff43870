//! Deposit correlation
//!
//! Incoming transactions fund expected deposits; a funded deposit becomes a
//! pending order. Finality of the funding transaction activates the order.

use chrono::Utc;
use contracts::ledger::LedgerOutput;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use types::asset::Asset;
use types::deposit::ExpectedDeposit;
use types::ids::{DeviceAddress, OrderId, PairId, UnitId};
use types::numeric::Amount;
use types::order::OrderDraft;

use crate::error::ExchangeError;
use crate::exchange::Exchange;
use crate::notify::Notification;

/// Why an output did not fund a deposit at its address. The deposit stays
/// open and a later payment may still fund it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DepositMiss {
    #[error("amount too low: expected {expected}, got {got}")]
    AmountTooLow { expected: Amount, got: Amount },

    #[error("amount must match exactly: expected {expected}, got {got}")]
    NonExactAmount { expected: Amount, got: Amount },

    #[error("no fee paid")]
    NoFee,

    #[error("{count} fee outputs")]
    MultipleFees { count: usize },

    #[error("fee {fee} is below the minimum {min_fee}")]
    FeeTooLow { fee: Amount, min_fee: Amount },
}

/// Orders created from one batch of transactions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationReport {
    pub received: Vec<OrderId>,
    pub misses: Vec<(u64, DepositMiss)>,
}

/// Check `output` against `deposit` and build the pending order it funds.
///
/// `unit_outputs` are all outputs of the same transaction; a non-base
/// deposit's fee must be among them.
pub fn correlate(
    deposit: &ExpectedDeposit,
    output: &LedgerOutput,
    unit_outputs: &[LedgerOutput],
    min_fee: Amount,
) -> Result<OrderDraft, DepositMiss> {
    let expected = deposit.in_amount;
    let (fee, fee_funding) = match &deposit.asset_expected_in {
        Asset::Base => {
            if output.amount < expected {
                return Err(DepositMiss::AmountTooLow {
                    expected,
                    got: output.amount,
                });
            }
            (output.amount - expected, output.output.clone())
        }
        Asset::Issued(_) => {
            if output.amount != expected {
                return Err(if output.amount < expected {
                    DepositMiss::AmountTooLow {
                        expected,
                        got: output.amount,
                    }
                } else {
                    DepositMiss::NonExactAmount {
                        expected,
                        got: output.amount,
                    }
                });
            }
            let fee_outputs: Vec<&LedgerOutput> = unit_outputs
                .iter()
                .filter(|o| o.asset == Asset::Base && o.address == deposit.order_address)
                .collect();
            match fee_outputs.as_slice() {
                [] => return Err(DepositMiss::NoFee),
                [fee_output] => (fee_output.amount, fee_output.output.clone()),
                many => return Err(DepositMiss::MultipleFees { count: many.len() }),
            }
        }
    };
    if fee < min_fee {
        return Err(DepositMiss::FeeTooLow { fee, min_fee });
    }

    let (amount, counter_amount) = deposit.order_amounts();
    Ok(OrderDraft {
        pair_id: deposit.pair_id,
        order_type: deposit.order_type,
        order_address: deposit.order_address.clone(),
        owner_address: deposit.escrow.owner().clone(),
        device_address: deposit.device_address.clone(),
        amount,
        counter_amount,
        price: deposit.price,
        int_price: deposit.int_price,
        fee,
        funding: output.output.clone(),
        fee_funding,
    })
}

impl Exchange {
    /// Correlate the outputs of newly seen transactions with open deposits.
    #[instrument(skip_all, fields(units = units.len()))]
    pub async fn handle_new_transactions(&self, units: &[UnitId]) -> Result<CorrelationReport, ExchangeError> {
        let _write = self.write.lock().await;
        let mut report = CorrelationReport::default();
        let mut received: BTreeMap<(DeviceAddress, Asset), (Amount, usize)> = BTreeMap::new();

        for unit in units {
            let outputs = self.ledger.outputs(unit).await?;
            for output in &outputs {
                let deposits = self.store.open_deposits_at(&output.address)?;
                for deposit in deposits.iter().filter(|d| d.asset_expected_in == output.asset) {
                    let draft = match correlate(deposit, output, &outputs, self.config.min_fee) {
                        Ok(draft) => draft,
                        Err(miss) => {
                            warn!(
                                deposit_id = %deposit.expected_deposit_id,
                                unit = %unit,
                                reason = %miss,
                                "deposit not funded"
                            );
                            report.misses.push((deposit.expected_deposit_id.get(), miss));
                            continue;
                        }
                    };
                    let order = self
                        .store
                        .receive_deposit(deposit.expected_deposit_id, draft, Utc::now())?;
                    info!(
                        deposit_id = %deposit.expected_deposit_id,
                        order_id = %order.order_id,
                        unit = %unit,
                        "deposit received"
                    );
                    let entry = received
                        .entry((order.device_address.clone(), output.asset.clone()))
                        .or_insert((0, 0));
                    entry.0 += output.amount;
                    entry.1 += 1;
                    report.received.push(order.order_id);
                    break;
                }
            }
        }

        for ((device, asset), (amount, lots)) in received {
            self.notifier
                .notify(&device, Notification::DepositReceived { asset, amount, lots })
                .await;
        }
        Ok(report)
    }

    /// Activate pending orders funded by units stable at `mci`.
    ///
    /// Returns the pairs that gained active orders; each needs a matching pass.
    #[instrument(skip(self))]
    pub async fn handle_stabilized(&self, mci: u64) -> Result<BTreeSet<PairId>, ExchangeError> {
        drop(self.write.lock().await);

        if let Err(err) = self.operator.resolve(self.ledger.as_ref()).await {
            warn!(error = %err, "operator resolution failed");
        }

        let units = self.ledger.units_stabilized_at(mci).await?;
        if units.is_empty() {
            return Ok(BTreeSet::new());
        }
        let pending = self.store.pending_orders_funded_by(&units)?;
        if pending.is_empty() {
            debug!(units = units.len(), "no pending orders funded by stable units");
            return Ok(BTreeSet::new());
        }
        let ids: Vec<OrderId> = pending.iter().map(|o| o.order_id).collect();
        let activated = self.store.activate_orders(&ids)?;

        let mut per_device: BTreeMap<DeviceAddress, usize> = BTreeMap::new();
        let mut pairs = BTreeSet::new();
        for order in &activated {
            *per_device.entry(order.device_address.clone()).or_default() += 1;
            pairs.insert(order.pair_id);
        }
        info!(activated = activated.len(), pairs = pairs.len(), "orders activated");
        for (device, count) in per_device {
            self.notifier.notify(&device, Notification::OrdersActivated { count }).await;
        }
        Ok(pairs)
    }
}
