//! Expected deposits
//!
//! One row per lot, created at intake and consumed exactly once when a
//! matching funding output appears on the ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::escrow::EscrowDefinition;
use crate::ids::{Address, DeviceAddress, ExpectedDepositId, PairId};
use crate::numeric::{Amount, IntPrice};
use crate::order::OrderType;

/// Intake-time fields of an expected deposit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedDepositDraft {
    pub pair_id: PairId,
    pub order_type: OrderType,
    pub price: Decimal,
    pub int_price: IntPrice,
    pub device_address: DeviceAddress,
    pub order_address: Address,
    pub asset_expected_in: Asset,
    pub in_amount: Amount,
    pub escrow: EscrowDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedDeposit {
    pub expected_deposit_id: ExpectedDepositId,
    pub pair_id: PairId,
    pub order_type: OrderType,
    pub price: Decimal,
    pub int_price: IntPrice,
    pub device_address: DeviceAddress,
    pub order_address: Address,
    pub asset_expected_in: Asset,
    pub in_amount: Amount,
    pub escrow: EscrowDefinition,
    pub received_date: Option<DateTime<Utc>>,
}

impl ExpectedDeposit {
    pub fn from_draft(expected_deposit_id: ExpectedDepositId, draft: ExpectedDepositDraft) -> Self {
        Self {
            expected_deposit_id,
            pair_id: draft.pair_id,
            order_type: draft.order_type,
            price: draft.price,
            int_price: draft.int_price,
            device_address: draft.device_address,
            order_address: draft.order_address,
            asset_expected_in: draft.asset_expected_in,
            in_amount: draft.in_amount,
            escrow: draft.escrow,
            received_date: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.received_date.is_none()
    }

    /// Whether an output of `asset` and `amount` at this deposit's address can fund it.
    pub fn accepts(&self, asset: &Asset, amount: Amount) -> bool {
        self.is_open() && *asset == self.asset_expected_in && amount >= self.in_amount
    }

    /// Asset1 and asset2 quantities of the order this deposit funds.
    pub fn order_amounts(&self) -> (Amount, Amount) {
        let out_amount = self.escrow.out_amount();
        match self.order_type {
            OrderType::Buy => (out_amount, self.in_amount),
            OrderType::Sell => (self.in_amount, out_amount),
        }
    }
}
