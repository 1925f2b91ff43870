//! Order lifecycle types
//!
//! An order is one funded lot. It starts pending once its funding
//! transaction is seen, becomes active only when the ledger reports that
//! transaction final, and ends either filled by a deal or cancelled because
//! its escrow was spent elsewhere.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::OrderError;
use crate::ids::{Address, DealId, DeviceAddress, MatchId, OrderId, OutputRef, PairId};
use crate::numeric::{Amount, IntPrice};

/// Order side. A buy spends asset2 to receive asset1, a sell the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Buy,
    Sell,
}

impl OrderType {
    pub fn opposite(&self) -> Self {
        match self {
            OrderType::Buy => OrderType::Sell,
            OrderType::Sell => OrderType::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Buy => "buy",
            OrderType::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state. Exactly one holds at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OrderState {
    /// Funding transaction seen but not yet final
    Pending,
    /// Eligible for matching
    Active,
    /// Settled by a deal (terminal)
    Filled {
        deal_id: DealId,
        match_id: MatchId,
        fill_date: DateTime<Utc>,
        actual_counter_amount: Amount,
    },
    /// Escrow spent outside a deal (terminal)
    Cancelled { cancel_date: DateTime<Utc> },
}

impl OrderState {
    /// Legacy tri-state view: `None` pending, `Some(true)` active,
    /// `Some(false)` terminal.
    pub fn is_active(&self) -> Option<bool> {
        match self {
            OrderState::Pending => None,
            OrderState::Active => Some(true),
            OrderState::Filled { .. } | OrderState::Cancelled { .. } => Some(false),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.is_active() == Some(false)
    }

    pub fn name(&self) -> &'static str {
        match self {
            OrderState::Pending => "pending",
            OrderState::Active => "active",
            OrderState::Filled { .. } => "filled",
            OrderState::Cancelled { .. } => "cancelled",
        }
    }
}

/// Fields of an order known at deposit correlation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub pair_id: PairId,
    pub order_type: OrderType,
    pub order_address: Address,
    pub owner_address: Address,
    pub device_address: DeviceAddress,
    /// Asset1 quantity of the lot
    pub amount: Amount,
    /// Asset2 quantity of the lot
    pub counter_amount: Amount,
    pub price: Decimal,
    pub int_price: IntPrice,
    pub fee: Amount,
    /// Output funding the escrowed asset
    pub funding: OutputRef,
    /// Output paying the fee; equals `funding` when the fee rides on a base-asset deposit
    pub fee_funding: OutputRef,
}

/// A funded lot in the order book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub pair_id: PairId,
    pub order_type: OrderType,
    pub order_address: Address,
    pub owner_address: Address,
    pub device_address: DeviceAddress,
    pub amount: Amount,
    pub counter_amount: Amount,
    pub price: Decimal,
    pub int_price: IntPrice,
    pub fee: Amount,
    pub funding: OutputRef,
    pub fee_funding: OutputRef,
    pub state: OrderState,
    pub creation_date: DateTime<Utc>,
}

impl Order {
    /// New pending order from a correlated deposit.
    pub fn from_draft(order_id: OrderId, draft: OrderDraft, creation_date: DateTime<Utc>) -> Self {
        Self {
            order_id,
            pair_id: draft.pair_id,
            order_type: draft.order_type,
            order_address: draft.order_address,
            owner_address: draft.owner_address,
            device_address: draft.device_address,
            amount: draft.amount,
            counter_amount: draft.counter_amount,
            price: draft.price,
            int_price: draft.int_price,
            fee: draft.fee,
            funding: draft.funding,
            fee_funding: draft.fee_funding,
            state: OrderState::Pending,
            creation_date,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == OrderState::Active
    }

    /// True when the fee was paid inside the funding output (base-asset deposits).
    pub fn fee_paid_inline(&self) -> bool {
        self.funding == self.fee_funding
    }

    /// Price compatibility with an order of the opposite side.
    ///
    /// A sell crosses a buy priced at or above it; a buy crosses a sell
    /// priced at or below it. Orders of the same side never cross.
    pub fn crosses(&self, other: &Order) -> bool {
        match (self.order_type, other.order_type) {
            (OrderType::Sell, OrderType::Buy) => self.int_price <= other.int_price,
            (OrderType::Buy, OrderType::Sell) => self.int_price >= other.int_price,
            _ => false,
        }
    }

    /// Pending → active, triggered only by ledger finality.
    pub fn activate(&mut self) -> Result<(), OrderError> {
        match self.state {
            OrderState::Pending => {
                self.state = OrderState::Active;
                Ok(())
            }
            _ => Err(self.transition_error("active")),
        }
    }

    /// Active → filled.
    pub fn fill(&mut self, deal_id: DealId, match_id: MatchId, fill_date: DateTime<Utc>) -> Result<(), OrderError> {
        match self.state {
            OrderState::Active => {
                self.state = OrderState::Filled {
                    deal_id,
                    match_id,
                    fill_date,
                    actual_counter_amount: self.counter_amount,
                };
                Ok(())
            }
            _ => Err(self.transition_error("filled")),
        }
    }

    /// Active → cancelled.
    pub fn cancel(&mut self, cancel_date: DateTime<Utc>) -> Result<(), OrderError> {
        match self.state {
            OrderState::Active => {
                self.state = OrderState::Cancelled { cancel_date };
                Ok(())
            }
            _ => Err(self.transition_error("cancelled")),
        }
    }

    fn transition_error(&self, to: &str) -> OrderError {
        OrderError::InvalidStateTransition {
            order_id: self.order_id,
            from: self.state.name().to_string(),
            to: to.to_string(),
        }
    }
}
