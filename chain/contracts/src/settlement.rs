//! Settlement planning
//!
//! Turns accepted matches into one balanced multi-asset transfer. For every
//! matched order the escrowed input is routed to the asset it sold and an
//! output of the counter asset is routed to its owner. Fees are folded into
//! the base-asset inputs.
//!
//! Invariants checked before anything is composed:
//! - every match balances (`sum(buy.amount) == sum(sell.amount)`)
//! - for every asset `inputs - outputs >= 0`
//!
//! A positive non-base residual only arises when limit prices cross
//! favourably; it is paid to the operator fee address. The base residual is
//! left to the composer's change output, which also pays the operator.

use std::collections::BTreeMap;
use types::asset::Asset;
use types::deal::Match;
use types::errors::InvariantViolation;
use types::escrow::SigningPath;
use types::ids::{Address, DeviceAddress, OrderId, OutputRef, PairId};
use types::numeric::Amount;
use types::order::{Order, OrderType};
use types::pair::TradingPair;

use crate::ledger::{Payment, PaymentMessage, TransferRequest};

/// Running input/output totals of one asset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetTotals {
    pub inputs: Amount,
    pub outputs: Amount,
}

impl AssetTotals {
    /// `inputs - outputs`, failing if the settlement would fabricate value.
    pub fn balance(&self, asset: &Asset) -> Result<Amount, InvariantViolation> {
        self.inputs
            .checked_sub(self.outputs)
            .ok_or_else(|| InvariantViolation::NegativeBalance {
                asset: asset.to_string(),
                inputs: self.inputs,
                outputs: self.outputs,
            })
    }
}

/// Everything needed to compose, record and announce one deal
#[derive(Debug, Clone)]
pub struct SettlementPlan {
    pub pair_id: PairId,
    pub request: TransferRequest,
    /// Order ids of each match, in match order
    pub match_order_ids: Vec<Vec<OrderId>>,
    /// Distinct participant devices to notify
    pub device_addresses: Vec<DeviceAddress>,
    pub totals: BTreeMap<Asset, AssetTotals>,
    /// Non-base residuals captured by the operator
    pub operator_residuals: BTreeMap<Asset, Amount>,
}

impl SettlementPlan {
    pub fn order_ids(&self) -> impl Iterator<Item = &OrderId> {
        self.match_order_ids.iter().flatten()
    }

    pub fn author_count(&self) -> usize {
        self.request.paying_addresses.len()
    }
}

#[derive(Default)]
struct Accumulator {
    paying_addresses: Vec<Address>,
    inputs: BTreeMap<Asset, Vec<OutputRef>>,
    outputs: BTreeMap<Asset, Vec<Payment>>,
    totals: BTreeMap<Asset, AssetTotals>,
    devices: Vec<DeviceAddress>,
}

impl Accumulator {
    fn add(totals: &mut Amount, amount: Amount, asset: &Asset) -> Result<(), InvariantViolation> {
        *totals = totals
            .checked_add(amount)
            .ok_or_else(|| InvariantViolation::Overflow { asset: asset.to_string() })?;
        Ok(())
    }

    /// Route one order's escrow to its sold asset and its proceeds to its owner.
    fn route(&mut self, pair: &TradingPair, order: &Order) -> Result<(), InvariantViolation> {
        let in_asset = pair.in_asset(order.order_type).clone();
        let out_asset = pair.out_asset(order.order_type).clone();
        let (in_amount, out_amount) = match order.order_type {
            OrderType::Buy => (order.counter_amount, order.amount),
            OrderType::Sell => (order.amount, order.counter_amount),
        };

        if !self.paying_addresses.contains(&order.order_address) {
            self.paying_addresses.push(order.order_address.clone());
        }
        if !self.devices.contains(&order.device_address) {
            self.devices.push(order.device_address.clone());
        }

        self.inputs.entry(in_asset.clone()).or_default().push(order.funding.clone());
        self.outputs.entry(out_asset.clone()).or_default().push(Payment {
            address: order.owner_address.clone(),
            amount: out_amount,
        });
        Self::add(&mut self.totals.entry(in_asset.clone()).or_default().inputs, in_amount, &in_asset)?;
        Self::add(&mut self.totals.entry(out_asset.clone()).or_default().outputs, out_amount, &out_asset)?;
        Self::add(&mut self.totals.entry(Asset::Base).or_default().inputs, order.fee, &Asset::Base)?;

        if order.fee_paid_inline() {
            if !in_asset.is_base() {
                return Err(InvariantViolation::FeeOutputMismatch {
                    order_id: order.order_id,
                    asset: in_asset.to_string(),
                });
            }
        } else {
            self.inputs.entry(Asset::Base).or_default().push(order.fee_funding.clone());
        }
        Ok(())
    }
}

/// Build the settlement of `matches` for `pair`.
pub fn plan_settlement(
    pair: &TradingPair,
    matches: &[Match],
    operator_fee_address: &Address,
) -> Result<SettlementPlan, InvariantViolation> {
    let mut acc = Accumulator::default();
    for asset in [&pair.asset1, &pair.asset2, &Asset::Base] {
        acc.totals.entry(asset.clone()).or_default();
    }

    let mut match_order_ids = Vec::with_capacity(matches.len());
    for m in matches {
        m.check_balanced()?;
        for order in m.orders() {
            acc.route(pair, order)?;
        }
        match_order_ids.push(m.order_ids());
    }

    let mut operator_residuals = BTreeMap::new();
    for (asset, totals) in &acc.totals {
        let balance = totals.balance(asset)?;
        if balance > 0 && !asset.is_base() {
            operator_residuals.insert(asset.clone(), balance);
        }
    }
    for (asset, &residual) in &operator_residuals {
        acc.outputs.entry(asset.clone()).or_default().push(Payment {
            address: operator_fee_address.clone(),
            amount: residual,
        });
    }

    let mut base_payouts = acc.outputs.remove(&Asset::Base).unwrap_or_default();
    base_payouts.sort();
    let mut base_outputs = vec![Payment {
        address: operator_fee_address.clone(),
        amount: 0,
    }];
    base_outputs.extend(base_payouts);

    let mut messages = Vec::new();
    for (asset, mut outputs) in std::mem::take(&mut acc.outputs) {
        let Asset::Issued(asset_id) = asset else {
            continue;
        };
        let mut inputs = acc.inputs.remove(&Asset::Issued(asset_id.clone())).unwrap_or_default();
        inputs.sort();
        outputs.sort();
        messages.push(PaymentMessage {
            asset: asset_id,
            inputs,
            outputs,
        });
    }

    let mut base_inputs = acc.inputs.remove(&Asset::Base).unwrap_or_default();
    base_inputs.sort();
    let base_input_amount = acc.totals.get(&Asset::Base).map(|t| t.inputs).unwrap_or_default();

    Ok(SettlementPlan {
        pair_id: pair.pair_id,
        request: TransferRequest {
            paying_addresses: acc.paying_addresses,
            base_inputs,
            base_input_amount,
            base_outputs,
            messages,
            commission_recipient: operator_fee_address.clone(),
            signing_path: SigningPath::Operator,
        },
        match_order_ids,
        device_addresses: acc.devices,
        totals: acc.totals,
        operator_residuals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use types::ids::{OrderId, UnitId};
    use types::order::OrderDraft;

    fn pair(asset2: Asset) -> TradingPair {
        TradingPair {
            pair_id: PairId::new(1),
            asset1: Asset::issued("GOLD"),
            asset2,
            price_multiplier: 1,
            amount_increment: 1,
            delisted: false,
        }
    }

    fn order(id: u64, order_type: OrderType, amount: Amount, price: u64, fee: Amount, inline_fee: bool) -> Order {
        let unit = UnitId::new(format!("unit{}", id));
        let funding = OutputRef::new(unit.clone(), 0, 0);
        let fee_funding = if inline_fee { funding.clone() } else { OutputRef::new(unit, 1, 0) };
        let mut order = Order::from_draft(
            OrderId::new(id),
            OrderDraft {
                pair_id: PairId::new(1),
                order_type,
                order_address: Address::new(format!("ESCROW{}", id)),
                owner_address: Address::new(format!("OWNER{}", id)),
                device_address: DeviceAddress::new(format!("DEVICE{}", id)),
                amount,
                counter_amount: amount * price,
                price: price.into(),
                int_price: price,
                fee,
                funding,
                fee_funding,
            },
            Utc::now(),
        );
        order.activate().unwrap();
        order
    }

    fn operator() -> Address {
        Address::from("OPERATOR")
    }

    #[test]
    fn test_exact_match_has_zero_residual() {
        let pair = pair(Asset::issued("USD"));
        let m = Match::new(
            vec![order(1, OrderType::Buy, 100, 10, 5, false)],
            vec![order(2, OrderType::Sell, 100, 10, 5, false)],
        );
        let plan = plan_settlement(&pair, &[m], &operator()).unwrap();

        let gold = &plan.totals[&Asset::issued("GOLD")];
        let usd = &plan.totals[&Asset::issued("USD")];
        assert_eq!((gold.inputs, gold.outputs), (100, 100));
        assert_eq!((usd.inputs, usd.outputs), (1000, 1000));
        assert!(plan.operator_residuals.is_empty());
        assert_eq!(plan.request.base_input_amount, 10);
        assert_eq!(plan.request.base_inputs.len(), 2);
        assert_eq!(plan.author_count(), 2);
        assert_eq!(plan.request.signing_path, SigningPath::Operator);
    }

    #[test]
    fn test_proceeds_go_to_owners() {
        let pair = pair(Asset::issued("USD"));
        let m = Match::new(
            vec![order(1, OrderType::Buy, 100, 10, 5, false)],
            vec![order(2, OrderType::Sell, 100, 10, 5, false)],
        );
        let plan = plan_settlement(&pair, &[m], &operator()).unwrap();

        let gold = plan.request.messages.iter().find(|m| m.asset.as_str() == "GOLD").unwrap();
        assert_eq!(gold.outputs, vec![Payment { address: Address::from("OWNER1"), amount: 100 }]);
        let usd = plan.request.messages.iter().find(|m| m.asset.as_str() == "USD").unwrap();
        assert_eq!(usd.outputs, vec![Payment { address: Address::from("OWNER2"), amount: 1000 }]);
    }

    #[test]
    fn test_crossed_spread_goes_to_operator() {
        let pair = pair(Asset::issued("USD"));
        let m = Match::new(
            vec![order(1, OrderType::Buy, 100, 10, 1000, false)],
            vec![order(2, OrderType::Sell, 100, 9, 1000, false)],
        );
        let plan = plan_settlement(&pair, &[m], &operator()).unwrap();

        assert_eq!(plan.operator_residuals.get(&Asset::issued("USD")), Some(&100));
        let usd = plan.request.messages.iter().find(|m| m.asset.as_str() == "USD").unwrap();
        assert!(usd.outputs.contains(&Payment { address: operator(), amount: 100 }));
    }

    #[test]
    fn test_base_pair_folds_inline_fees() {
        let pair = pair(Asset::Base);
        let m = Match::new(
            vec![order(1, OrderType::Buy, 100, 10, 1000, true)],
            vec![order(2, OrderType::Sell, 60, 10, 1000, false), order(3, OrderType::Sell, 40, 10, 1000, false)],
        );
        let plan = plan_settlement(&pair, &[m], &operator()).unwrap();

        // buyer's escrow (1000 + fee) plus the sellers' separate fee outputs
        assert_eq!(plan.request.base_inputs.len(), 3);
        assert_eq!(plan.request.base_input_amount, 1000 + 3000);
        assert_eq!(plan.request.base_outputs[0], Payment { address: operator(), amount: 0 });
        assert_eq!(plan.request.base_outputs.len(), 3);
        assert_eq!(plan.request.messages.len(), 1);
        assert_eq!(plan.match_order_ids, vec![vec![OrderId::new(1), OrderId::new(2), OrderId::new(3)]]);
        assert_eq!(plan.device_addresses.len(), 3);
    }

    #[test]
    fn test_inline_fee_on_issued_asset_is_invariant_violation() {
        let pair = pair(Asset::issued("USD"));
        let m = Match::new(
            vec![order(1, OrderType::Buy, 100, 10, 1000, true)],
            vec![order(2, OrderType::Sell, 100, 10, 1000, false)],
        );
        assert!(matches!(
            plan_settlement(&pair, &[m], &operator()),
            Err(InvariantViolation::FeeOutputMismatch { .. })
        ));
    }

    #[test]
    fn test_underpriced_buy_is_negative_balance() {
        let pair = pair(Asset::issued("USD"));
        let m = Match::new(
            vec![order(1, OrderType::Buy, 100, 9, 1000, false)],
            vec![order(2, OrderType::Sell, 100, 10, 1000, false)],
        );
        assert!(matches!(
            plan_settlement(&pair, &[m], &operator()),
            Err(InvariantViolation::NegativeBalance { .. })
        ));
    }

    #[test]
    fn test_unbalanced_match_rejected() {
        let pair = pair(Asset::issued("USD"));
        let m = Match::new(
            vec![order(1, OrderType::Buy, 100, 10, 1000, false)],
            vec![order(2, OrderType::Sell, 64, 10, 1000, false)],
        );
        assert_eq!(
            plan_settlement(&pair, &[m], &operator()).unwrap_err(),
            InvariantViolation::UnbalancedMatch { buy: 100, sell: 64 }
        );
    }
}
