//! In-memory store
//!
//! All tables live behind one mutex, so every trait call is atomic with
//! respect to every other. Rows are kept in BTreeMaps keyed by surrogate id
//! for deterministic iteration.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;
use types::deal::{Deal, MatchRecord};
use types::deposit::{ExpectedDeposit, ExpectedDepositDraft};
use types::ids::{Address, DealId, ExpectedDepositId, MatchId, OrderId, PairId, UnitId};
use types::order::{Order, OrderDraft};
use types::pair::TradingPair;

use crate::store::{ExchangeStore, RecordedSettlement, StoreError};

#[derive(Default)]
struct Tables {
    pairs: BTreeMap<PairId, TradingPair>,
    used_addresses: HashSet<Address>,
    expected_deposits: BTreeMap<ExpectedDepositId, ExpectedDeposit>,
    orders: BTreeMap<OrderId, Order>,
    deals: BTreeMap<DealId, Deal>,
    matches: BTreeMap<MatchId, MatchRecord>,
    next_deposit_id: u64,
    next_order_id: u64,
    next_deal_id: u64,
    next_match_id: u64,
}

fn next(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ExchangeStore for MemoryStore {
    fn insert_pair(&self, pair: TradingPair) -> Result<(), StoreError> {
        self.tables().pairs.insert(pair.pair_id, pair);
        Ok(())
    }

    fn pair(&self, pair_id: PairId) -> Result<TradingPair, StoreError> {
        self.tables()
            .pairs
            .get(&pair_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("pairs", pair_id))
    }

    fn insert_expected_deposit(&self, draft: ExpectedDepositDraft) -> Result<ExpectedDeposit, StoreError> {
        let mut tables = self.tables();
        if !tables.used_addresses.insert(draft.order_address.clone()) {
            return Err(StoreError::AddressReuse(draft.order_address));
        }
        let id = ExpectedDepositId::new(next(&mut tables.next_deposit_id));
        let deposit = ExpectedDeposit::from_draft(id, draft);
        tables.expected_deposits.insert(id, deposit.clone());
        Ok(deposit)
    }

    fn open_deposits_at(&self, address: &Address) -> Result<Vec<ExpectedDeposit>, StoreError> {
        Ok(self
            .tables()
            .expected_deposits
            .values()
            .filter(|d| d.is_open() && &d.order_address == address)
            .cloned()
            .collect())
    }

    fn expected_deposit(&self, id: ExpectedDepositId) -> Result<ExpectedDeposit, StoreError> {
        self.tables()
            .expected_deposits
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("expected_deposits", id))
    }

    fn receive_deposit(
        &self,
        id: ExpectedDepositId,
        draft: OrderDraft,
        at: DateTime<Utc>,
    ) -> Result<Order, StoreError> {
        let mut tables = self.tables();
        let deposit = tables
            .expected_deposits
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("expected_deposits", id))?;
        if !deposit.is_open() {
            return Err(StoreError::AlreadyReceived(id));
        }
        deposit.received_date = Some(at);
        let order_id = OrderId::new(next(&mut tables.next_order_id));
        let order = Order::from_draft(order_id, draft, at);
        tables.orders.insert(order_id, order.clone());
        Ok(order)
    }

    fn order(&self, order_id: OrderId) -> Result<Order, StoreError> {
        self.tables()
            .orders
            .get(&order_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("orders", order_id))
    }

    fn pending_orders_funded_by(&self, units: &[UnitId]) -> Result<Vec<Order>, StoreError> {
        let units: HashSet<&UnitId> = units.iter().collect();
        Ok(self
            .tables()
            .orders
            .values()
            .filter(|o| o.state.is_active().is_none() && units.contains(&o.funding.unit))
            .cloned()
            .collect())
    }

    fn activate_orders(&self, order_ids: &[OrderId]) -> Result<Vec<Order>, StoreError> {
        let mut tables = self.tables();
        let mut activated = Vec::new();
        for order_id in order_ids {
            let order = tables
                .orders
                .get_mut(order_id)
                .ok_or_else(|| StoreError::not_found("orders", order_id))?;
            if order.activate().is_ok() {
                activated.push(order.clone());
            }
        }
        Ok(activated)
    }

    fn active_orders(&self, pair_id: PairId) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .tables()
            .orders
            .values()
            .filter(|o| o.pair_id == pair_id && o.is_active())
            .cloned()
            .collect())
    }

    fn cancel_orders(&self, order_ids: &[OrderId], at: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut tables = self.tables();
        let mut cancelled = 0;
        for order_id in order_ids {
            if let Some(order) = tables.orders.get_mut(order_id) {
                if order.cancel(at).is_ok() {
                    cancelled += 1;
                }
            }
        }
        Ok(cancelled)
    }

    fn record_settlement(
        &self,
        unit: &UnitId,
        match_groups: &[Vec<OrderId>],
        at: DateTime<Utc>,
    ) -> Result<RecordedSettlement, StoreError> {
        let mut tables = self.tables();
        for order_id in match_groups.iter().flatten() {
            let order = tables
                .orders
                .get(order_id)
                .ok_or_else(|| StoreError::not_found("orders", order_id))?;
            if !order.is_active() {
                return Err(StoreError::NotActive { order_id: *order_id });
            }
        }

        let deal_id = DealId::new(next(&mut tables.next_deal_id));
        let deal = Deal {
            deal_id,
            unit: unit.clone(),
            created_at: at,
        };
        tables.deals.insert(deal_id, deal.clone());

        let mut matches = Vec::with_capacity(match_groups.len());
        for group in match_groups {
            let match_id = MatchId::new(next(&mut tables.next_match_id));
            for order_id in group {
                if let Some(order) = tables.orders.get_mut(order_id) {
                    order.fill(deal_id, match_id, at)?;
                }
            }
            let record = MatchRecord {
                match_id,
                deal_id,
                order_ids: group.clone(),
            };
            tables.matches.insert(match_id, record.clone());
            matches.push(record);
        }
        debug!(deal_id = %deal_id, unit = %unit, matches = matches.len(), "settlement recorded");
        Ok(RecordedSettlement { deal, matches })
    }

    fn deals(&self) -> Result<Vec<Deal>, StoreError> {
        Ok(self.tables().deals.values().cloned().collect())
    }

    fn matches_of_deal(&self, deal_id: DealId) -> Result<Vec<MatchRecord>, StoreError> {
        Ok(self
            .tables()
            .matches
            .values()
            .filter(|m| m.deal_id == deal_id)
            .cloned()
            .collect())
    }
}
