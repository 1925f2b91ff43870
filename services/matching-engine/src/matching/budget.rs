//! Party budget
//!
//! A settlement is one ledger transaction and the ledger caps the number of
//! distinct authors per transaction. The budget tracks the custody
//! addresses admitted so far in a pass; a match that would push the count
//! past the cap is deferred to the next pass and its orders stay active.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use types::deal::Match;
use types::ids::{Address, OrderId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeferralReason {
    /// Admitting the match would exceed the per-transaction author limit
    PartyCap,
}

/// A candidate match left for a later pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deferral {
    pub order_ids: Vec<OrderId>,
    /// Distinct authors the pass would have had with this match
    pub parties: usize,
    pub reason: DeferralReason,
}

#[derive(Debug, Clone)]
pub struct PartyBudget {
    cap: usize,
    authors: BTreeSet<Address>,
}

impl PartyBudget {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            authors: BTreeSet::new(),
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Distinct authors admitted so far
    pub fn used(&self) -> usize {
        self.authors.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.authors.len() >= self.cap
    }

    /// Authors the pass would have after admitting `candidate`.
    pub fn parties_with(&self, candidate: &Match) -> usize {
        let new = candidate
            .authors()
            .into_iter()
            .filter(|a| !self.authors.contains(*a))
            .count();
        self.authors.len() + new
    }

    /// Admit `candidate` if it fits, otherwise describe why it was deferred.
    pub fn admit(&mut self, candidate: &Match) -> Result<(), Deferral> {
        let parties = self.parties_with(candidate);
        if parties > self.cap {
            return Err(Deferral {
                order_ids: candidate.order_ids(),
                parties,
                reason: DeferralReason::PartyCap,
            });
        }
        self.authors.extend(candidate.authors().into_iter().cloned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{buy, sell};

    #[test]
    fn test_admit_counts_distinct_authors() {
        let mut budget = PartyBudget::new(4);
        budget.admit(&Match::new(vec![buy(1, 8, 10)], vec![sell(2, 8, 10)])).unwrap();
        assert_eq!(budget.used(), 2);
        budget.admit(&Match::new(vec![buy(3, 8, 10)], vec![sell(4, 8, 10)])).unwrap();
        assert!(budget.is_exhausted());
    }

    #[test]
    fn test_overflowing_match_deferred() {
        let mut budget = PartyBudget::new(3);
        budget.admit(&Match::new(vec![buy(1, 8, 10)], vec![sell(2, 8, 10)])).unwrap();

        let deferral = budget
            .admit(&Match::new(vec![buy(3, 8, 10)], vec![sell(4, 8, 10)]))
            .unwrap_err();
        assert_eq!(deferral.parties, 4);
        assert_eq!(deferral.reason, DeferralReason::PartyCap);
        assert_eq!(deferral.order_ids, vec![OrderId::new(3), OrderId::new(4)]);
        assert_eq!(budget.used(), 2);
    }
}
