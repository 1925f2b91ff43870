//! Store interface
//!
//! Every mutation a handler performs is one call here, so an implementation
//! can make each call a single transaction. Settlement recording in
//! particular must fill every order of every match or none.

use chrono::{DateTime, Utc};
use thiserror::Error;
use types::deal::{Deal, MatchRecord};
use types::deposit::{ExpectedDeposit, ExpectedDepositDraft};
use types::errors::OrderError;
use types::ids::{Address, DealId, ExpectedDepositId, OrderId, PairId, UnitId};
use types::order::{Order, OrderDraft};
use types::pair::TradingPair;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{table} row not found: {id}")]
    NotFound { table: &'static str, id: String },

    #[error("Custody address already used: {0}")]
    AddressReuse(Address),

    #[error("Expected deposit {0} already received")]
    AlreadyReceived(ExpectedDepositId),

    #[error("Order {order_id} is not active")]
    NotActive { order_id: OrderId },

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(table: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            table,
            id: id.to_string(),
        }
    }
}

/// A recorded settlement
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSettlement {
    pub deal: Deal,
    pub matches: Vec<MatchRecord>,
}

pub trait ExchangeStore: Send + Sync {
    fn insert_pair(&self, pair: TradingPair) -> Result<(), StoreError>;

    fn pair(&self, pair_id: PairId) -> Result<TradingPair, StoreError>;

    /// Store an expected deposit, claiming its custody address for good.
    fn insert_expected_deposit(&self, draft: ExpectedDepositDraft) -> Result<ExpectedDeposit, StoreError>;

    /// Open expected deposits waiting on `address`.
    fn open_deposits_at(&self, address: &Address) -> Result<Vec<ExpectedDeposit>, StoreError>;

    fn expected_deposit(&self, id: ExpectedDepositId) -> Result<ExpectedDeposit, StoreError>;

    /// Mark the deposit received and create its pending order in one step.
    fn receive_deposit(
        &self,
        id: ExpectedDepositId,
        draft: OrderDraft,
        at: DateTime<Utc>,
    ) -> Result<Order, StoreError>;

    fn order(&self, order_id: OrderId) -> Result<Order, StoreError>;

    /// Pending orders whose funding output belongs to one of `units`.
    fn pending_orders_funded_by(&self, units: &[UnitId]) -> Result<Vec<Order>, StoreError>;

    /// Pending → active. Orders in any other state are left alone.
    fn activate_orders(&self, order_ids: &[OrderId]) -> Result<Vec<Order>, StoreError>;

    fn active_orders(&self, pair_id: PairId) -> Result<Vec<Order>, StoreError>;

    /// Active → cancelled; returns how many orders changed.
    fn cancel_orders(&self, order_ids: &[OrderId], at: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Create the deal, one match row per group, and fill every order.
    fn record_settlement(
        &self,
        unit: &UnitId,
        match_groups: &[Vec<OrderId>],
        at: DateTime<Utc>,
    ) -> Result<RecordedSettlement, StoreError>;

    fn deals(&self) -> Result<Vec<Deal>, StoreError>;

    fn matches_of_deal(&self, deal_id: DealId) -> Result<Vec<MatchRecord>, StoreError>;
}
