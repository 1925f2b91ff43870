//! Matches and deals
//!
//! A match groups buy and sell orders whose asset1 amounts balance exactly.
//! A deal is one settlement transaction covering one or more matches; deals
//! are append-only history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::errors::InvariantViolation;
use crate::ids::{Address, DealId, MatchId, OrderId, UnitId};
use crate::numeric::Amount;
use crate::order::Order;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Match {
    pub buy: Vec<Order>,
    pub sell: Vec<Order>,
}

impl Match {
    pub fn new(buy: Vec<Order>, sell: Vec<Order>) -> Self {
        Self { buy, sell }
    }

    pub fn buy_amount(&self) -> Amount {
        self.buy.iter().map(|o| o.amount).sum()
    }

    pub fn sell_amount(&self) -> Amount {
        self.sell.iter().map(|o| o.amount).sum()
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.buy.iter().chain(self.sell.iter())
    }

    pub fn order_ids(&self) -> Vec<OrderId> {
        self.orders().map(|o| o.order_id).collect()
    }

    /// Distinct custody addresses that author inputs for this match.
    pub fn authors(&self) -> BTreeSet<&Address> {
        self.orders().map(|o| &o.order_address).collect()
    }

    /// Both sides present and their asset1 amounts equal.
    pub fn check_balanced(&self) -> Result<(), InvariantViolation> {
        if self.buy.is_empty() || self.sell.is_empty() {
            return Err(InvariantViolation::EmptyMatch);
        }
        let (buy, sell) = (self.buy_amount(), self.sell_amount());
        if buy != sell {
            return Err(InvariantViolation::UnbalancedMatch { buy, sell });
        }
        Ok(())
    }
}

/// One settlement transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub deal_id: DealId,
    pub unit: UnitId,
    pub created_at: DateTime<Utc>,
}

/// Persisted link between a deal and the orders of one match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: MatchId,
    pub deal_id: DealId,
    pub order_ids: Vec<OrderId>,
}
