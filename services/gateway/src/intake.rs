//! Order intake
//!
//! An order request becomes one escrow per lot. Each escrow is registered
//! with the ledger and recorded as an expected deposit before its custody
//! address and payment instructions go back to the requester.

use chrono::{Duration, Utc};
use contracts::errors::LedgerError;
use contracts::escrow::{custody_address, signers as escrow_signers};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use types::deposit::ExpectedDepositDraft;
use types::errors::OrderError;
use types::escrow::{EscrowDefinition, EscrowSigner, ReclaimBranch, SettleBranch};
use types::fee::{funding_payments, PaymentInstruction};
use types::ids::{Address, DeviceAddress, PairId};
use types::lots::{decompose, lot_count};
use types::numeric::{counter_amount, Amount, IntPrice, Rounding};
use types::order::OrderType;
use types::pair::TradingPair;

use crate::error::ExchangeError;
use crate::exchange::Exchange;
use crate::operator::OperatorContext;
use persistence::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub pair_id: PairId,
    pub order_type: OrderType,
    /// Asset2 per unit of asset1
    pub price: Decimal,
    /// Asset1 amount
    pub amount: Amount,
    /// Fee per lot, in base-asset units
    pub fee: Amount,
    pub destination_address: Address,
    pub device_address: DeviceAddress,
}

/// Escrow of one lot and how to fund it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotAddress {
    pub order_address: Address,
    /// Asset1 amount of the lot
    pub lot_amount: Amount,
    pub in_amount: Amount,
    pub out_amount: Amount,
    pub definition: EscrowDefinition,
    pub signers: Vec<EscrowSigner>,
    pub payments: Vec<PaymentInstruction>,
}

/// A lot that could not be placed; the requester may retry it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedLot {
    pub lot_amount: Amount,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedOrder {
    pub pair_id: PairId,
    pub order_type: OrderType,
    pub int_price: IntPrice,
    pub lots: Vec<LotAddress>,
    pub failed: Vec<FailedLot>,
    /// Fees of the placed lots
    pub total_fee: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub lots: usize,
    pub total_fee: Amount,
}

/// Lot count and total fee of an order of `amount` paying `fee` per lot.
pub fn quote(amount: Amount, fee: Amount) -> Quote {
    let lots = lot_count(amount);
    Quote {
        lots,
        total_fee: fee.saturating_mul(lots as u64),
    }
}

/// In and out amounts of one lot at the pair's integer price.
///
/// A buyer's escrow rounds up and a seller's proceeds round down, so crossed
/// orders always fund each other and any remainder is spread.
fn lot_amounts(
    pair: &TradingPair,
    order_type: OrderType,
    lot: Amount,
    int_price: IntPrice,
) -> Result<(Amount, Amount), OrderError> {
    let rounding = match order_type {
        OrderType::Buy => Rounding::Up,
        OrderType::Sell => Rounding::Down,
    };
    let counter = counter_amount(lot, int_price, pair.price_multiplier, rounding).ok_or_else(|| {
        OrderError::InvalidPrice(format!("{} overflows for a lot of {}", pair.display_price(int_price), lot))
    })?;
    if counter == 0 {
        return Err(OrderError::InvalidAmount(format!(
            "lot of {} at price {} is worth nothing",
            lot,
            pair.display_price(int_price)
        )));
    }
    Ok(match order_type {
        OrderType::Buy => (counter, lot),
        OrderType::Sell => (lot, counter),
    })
}

impl Exchange {
    /// The pair, if it is open for trading.
    pub fn trading_pair(&self, pair_id: PairId) -> Result<TradingPair, ExchangeError> {
        let pair = match self.store.pair(pair_id) {
            Ok(pair) => pair,
            Err(StoreError::NotFound { .. }) => return Err(OrderError::PairNotFound { pair_id }.into()),
            Err(err) => return Err(err.into()),
        };
        if pair.delisted {
            return Err(OrderError::PairDelisted { pair_id }.into());
        }
        Ok(pair)
    }

    fn validate_request(&self, pair: &TradingPair, request: &PlaceOrderRequest) -> Result<IntPrice, OrderError> {
        pair.validate_amount(request.amount)?;
        let int_price = pair.int_price(request.price)?;
        if request.fee < self.config.min_fee {
            return Err(OrderError::FeeBelowMinimum {
                fee: request.fee,
                min_fee: self.config.min_fee,
            });
        }
        Ok(int_price)
    }

    fn escrow_definition(
        &self,
        operator: &OperatorContext,
        pair: &TradingPair,
        request: &PlaceOrderRequest,
        out_amount: Amount,
        release_after: i64,
    ) -> EscrowDefinition {
        EscrowDefinition {
            reclaim: ReclaimBranch {
                owner: request.destination_address.clone(),
                timestamp_oracle: self.config.timestamper_address.clone(),
                release_after,
            },
            settle: SettleBranch {
                operator: operator.operator_address.clone(),
                out_asset: pair.out_asset(request.order_type).clone(),
                out_amount,
                beneficiary: request.destination_address.clone(),
            },
        }
    }

    /// Open the escrows of every lot of a validated request.
    pub(crate) async fn open_lots(
        &self,
        operator: &OperatorContext,
        pair: &TradingPair,
        request: &PlaceOrderRequest,
        int_price: IntPrice,
        release_after: i64,
    ) -> Result<PlacedOrder, ExchangeError> {
        let lot_sizes = decompose(request.amount);
        let mut amounts = Vec::with_capacity(lot_sizes.len());
        for &lot in &lot_sizes {
            amounts.push((lot, lot_amounts(pair, request.order_type, lot, int_price)?));
        }

        let in_asset = pair.in_asset(request.order_type).clone();
        let mut placed = PlacedOrder {
            pair_id: pair.pair_id,
            order_type: request.order_type,
            int_price,
            lots: Vec::with_capacity(amounts.len()),
            failed: Vec::new(),
            total_fee: 0,
        };

        let _write = self.write.lock().await;
        for (lot, (in_amount, out_amount)) in amounts {
            let definition = self.escrow_definition(operator, pair, request, out_amount, release_after);
            let order_address = custody_address(&definition)?;
            let signers = escrow_signers(&definition, &request.device_address, &operator.device_address);

            match self.ledger.register_escrow(&order_address, &definition, &signers).await {
                Ok(()) => {}
                Err(LedgerError::AddressInUse(address)) => {
                    warn!(address = %address, lot, "custody address registered with another definition");
                    placed.failed.push(FailedLot {
                        lot_amount: lot,
                        reason: OrderError::AddressReuse { address: address.to_string() }.to_string(),
                    });
                    continue;
                }
                Err(err) => return Err(err.into()),
            }

            let draft = ExpectedDepositDraft {
                pair_id: pair.pair_id,
                order_type: request.order_type,
                price: pair.display_price(int_price),
                int_price,
                device_address: request.device_address.clone(),
                order_address: order_address.clone(),
                asset_expected_in: in_asset.clone(),
                in_amount,
                escrow: definition.clone(),
            };
            match self.store.insert_expected_deposit(draft) {
                Ok(deposit) => {
                    info!(
                        deposit_id = %deposit.expected_deposit_id,
                        address = %order_address,
                        lot,
                        in_amount,
                        out_amount,
                        "expected deposit recorded"
                    );
                }
                Err(StoreError::AddressReuse(address)) => {
                    warn!(address = %address, lot, "custody address already used");
                    placed.failed.push(FailedLot {
                        lot_amount: lot,
                        reason: OrderError::AddressReuse { address: address.to_string() }.to_string(),
                    });
                    continue;
                }
                Err(err) => return Err(err.into()),
            }

            placed.total_fee += request.fee;
            placed.lots.push(LotAddress {
                payments: funding_payments(&order_address, &in_asset, in_amount, request.fee),
                order_address,
                lot_amount: lot,
                in_amount,
                out_amount,
                definition,
                signers,
            });
        }

        Ok(placed)
    }

    /// Validate an order request and open one escrow per lot.
    ///
    /// Request-level problems fail the whole call. A lot whose custody
    /// address is already in use is reported in `failed` while the other
    /// lots are placed.
    #[instrument(skip_all, fields(pair_id = %request.pair_id, order_type = %request.order_type))]
    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<PlacedOrder, ExchangeError> {
        let operator = self
            .operator
            .resolve(self.ledger.as_ref())
            .await?
            .ok_or(OrderError::OperatorNotReady)?
            .clone();
        let pair = self.trading_pair(request.pair_id)?;
        let int_price = self.validate_request(&pair, &request)?;
        if request.destination_address == operator.operator_address {
            return Err(OrderError::InvalidDestination {
                address: request.destination_address.to_string(),
            }
            .into());
        }

        let release_after = (Utc::now() + Duration::seconds(self.config.order_term_secs)).timestamp_millis();
        let placed = self
            .open_lots(&operator, &pair, &request, int_price, release_after)
            .await?;
        info!(lots = placed.lots.len(), failed = placed.failed.len(), "order placed");
        Ok(placed)
    }
}
