//! Matching engine core
//!
//! Runs one matching pass over the active orders of a pair: select the
//! crossed book, pair exact amounts, then fill anchors with sums, all under
//! one party budget.

use tracing::{debug, info};
use types::deal::Match;
use types::errors::InvariantViolation;
use types::order::Order;

use crate::book::select_crossed;
use crate::matching::budget::{Deferral, PartyBudget};
use crate::matching::exact::{find_exact_matches, ExactPhaseEnd};
use crate::matching::sum::find_sum_matches;

/// Result of one matching pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    pub matches: Vec<Match>,
    /// Candidates left for a later pass
    pub deferrals: Vec<Deferral>,
    /// Distinct authors across all accepted matches
    pub authors: usize,
}

impl MatchOutcome {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn order_count(&self) -> usize {
        self.matches.iter().map(|m| m.buy.len() + m.sell.len()).sum()
    }
}

/// Stateless matcher for one pair's book
#[derive(Debug, Clone, Copy)]
pub struct MatchingEngine {
    max_authors: usize,
}

impl MatchingEngine {
    /// Create an engine whose passes never exceed `max_authors` distinct authors
    pub fn new(max_authors: usize) -> Self {
        Self { max_authors }
    }

    pub fn max_authors(&self) -> usize {
        self.max_authors
    }

    /// Compute the matches of one pass over `active`.
    ///
    /// Any error is a logic defect, never a property of the input book.
    pub fn find_matches(&self, active: &[Order]) -> Result<MatchOutcome, InvariantViolation> {
        let mut rows = select_crossed(active);
        if rows.len() < 2 {
            return Ok(MatchOutcome::default());
        }
        debug!(crossed = rows.len(), "matching pass");

        let mut budget = PartyBudget::new(self.max_authors);
        let mut matches = Vec::new();
        let mut deferrals = Vec::new();

        let end = find_exact_matches(&mut rows, &mut budget, &mut matches, &mut deferrals);
        if end == ExactPhaseEnd::NoCounterpart {
            matches.extend(find_sum_matches(rows, &mut budget, &mut deferrals)?);
        }

        for m in &matches {
            m.check_balanced()?;
        }
        for deferral in &deferrals {
            info!(
                orders = ?deferral.order_ids,
                parties = deferral.parties,
                cap = budget.cap(),
                reason = ?deferral.reason,
                "match deferred to next pass"
            );
        }
        Ok(MatchOutcome {
            matches,
            deferrals,
            authors: budget.used(),
        })
    }

    /// Another pass may find more: this one settled something and was cut
    /// short by the party cap.
    pub fn should_rerun(&self, outcome: &MatchOutcome) -> bool {
        !outcome.is_empty() && (outcome.authors >= self.max_authors || !outcome.deferrals.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{buy, ids, order, sell};
    use proptest::prelude::*;
    use std::collections::HashSet;
    use types::order::OrderType;

    #[test]
    fn test_exact_scenario() {
        let engine = MatchingEngine::new(16);
        let book = vec![
            order(1, OrderType::Sell, 100, 10, 5),
            order(2, OrderType::Buy, 100, 10, 5),
        ];
        let outcome = engine.find_matches(&book).unwrap();
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.order_count(), 2);
        assert_eq!(outcome.authors, 2);
        assert!(!engine.should_rerun(&outcome));
    }

    #[test]
    fn test_sum_scenario() {
        let engine = MatchingEngine::new(16);
        let book = vec![sell(1, 60, 10), sell(2, 40, 10), buy(3, 100, 10)];
        let outcome = engine.find_matches(&book).unwrap();
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(ids(&outcome.matches[0].sell), vec![1, 2]);
        assert_eq!(ids(&outcome.matches[0].buy), vec![3]);
    }

    #[test]
    fn test_exact_phase_exhausting_book_skips_sums() {
        let engine = MatchingEngine::new(16);
        let book = vec![buy(1, 8, 10), sell(2, 8, 10), buy(3, 4, 10)];
        let outcome = engine.find_matches(&book).unwrap();
        assert_eq!(outcome.matches.len(), 1);
    }

    #[test]
    fn test_uncrossed_book() {
        let engine = MatchingEngine::new(16);
        let outcome = engine.find_matches(&[buy(1, 8, 9), sell(2, 8, 10)]).unwrap();
        assert!(outcome.is_empty());
    }

    #[test]
    fn test_cap_overflow_defers_and_requests_rerun() {
        let engine = MatchingEngine::new(4);
        let book: Vec<Order> = (0..6)
            .flat_map(|i| [buy(2 * i + 1, 8, 10), sell(2 * i + 2, 8, 10)])
            .collect();
        let outcome = engine.find_matches(&book).unwrap();
        assert_eq!(outcome.matches.len(), 2);
        assert_eq!(outcome.authors, 4);
        assert_eq!(outcome.deferrals.len(), 1);
        assert!(engine.should_rerun(&outcome));

        // the next pass sees the book without the settled orders
        let settled: HashSet<_> = outcome.matches.iter().flat_map(|m| m.order_ids()).collect();
        let rest: Vec<Order> = book.into_iter().filter(|o| !settled.contains(&o.order_id)).collect();
        let next = engine.find_matches(&rest).unwrap();
        assert_eq!(next.matches.len(), 2);
    }

    fn arb_book() -> impl Strategy<Value = Vec<Order>> {
        prop::collection::vec((any::<bool>(), 0u32..7, 8u64..13, 1000u64..1003), 0..40).prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (is_buy, exp, price, fee))| {
                    let side = if is_buy { OrderType::Buy } else { OrderType::Sell };
                    order(i as u64 + 1, side, 1 << exp, price, fee)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_matches_balance_and_cross(book in arb_book()) {
            let outcome = MatchingEngine::new(16).find_matches(&book).unwrap();
            for m in &outcome.matches {
                prop_assert_eq!(m.buy_amount(), m.sell_amount());
                for b in &m.buy {
                    for s in &m.sell {
                        prop_assert!(s.int_price <= b.int_price);
                    }
                }
            }
        }

        #[test]
        fn prop_orders_used_at_most_once(book in arb_book()) {
            let outcome = MatchingEngine::new(16).find_matches(&book).unwrap();
            let ids: Vec<_> = outcome.matches.iter().flat_map(|m| m.order_ids()).collect();
            let unique: HashSet<_> = ids.iter().collect();
            prop_assert_eq!(ids.len(), unique.len());
        }

        #[test]
        fn prop_party_cap_respected(book in arb_book(), cap in 2usize..8) {
            let outcome = MatchingEngine::new(cap).find_matches(&book).unwrap();
            let authors: HashSet<_> = outcome
                .matches
                .iter()
                .flat_map(|m| m.orders().map(|o| o.order_address.clone()))
                .collect();
            prop_assert!(authors.len() <= cap);
            prop_assert_eq!(authors.len(), outcome.authors);
        }
    }
}
