//! Exact-match phase
//!
//! Lots are powers of two, so two requests for the same notional amount
//! decompose into identical lot sequences. Pairing equal amounts one to one
//! therefore settles most of the book without any search.

use tracing::debug;
use types::deal::Match;
use types::order::{Order, OrderType};

use super::budget::{Deferral, PartyBudget};
use super::crossing::counterpart_crosses;

/// How the exact phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExactPhaseEnd {
    /// Fewer than two orders left
    Exhausted,
    /// The head order has no equal-amount counterpart; continue with summed fills
    NoCounterpart,
    /// The next pair did not fit the party budget
    PartyCap,
}

fn singleton(first: Order, counterpart: Order) -> Match {
    match first.order_type {
        OrderType::Buy => Match::new(vec![first], vec![counterpart]),
        OrderType::Sell => Match::new(vec![counterpart], vec![first]),
    }
}

/// Pair the head of `rows` with the first equal-amount opposite order that
/// crosses it, repeatedly. Matched orders are removed from `rows`.
pub fn find_exact_matches(
    rows: &mut Vec<Order>,
    budget: &mut PartyBudget,
    matches: &mut Vec<Match>,
    deferrals: &mut Vec<Deferral>,
) -> ExactPhaseEnd {
    while rows.len() > 1 {
        let first = &rows[0];
        let counterpart_index = rows
            .iter()
            .skip(1)
            .position(|row| row.amount == first.amount && counterpart_crosses(first, row))
            .map(|i| i + 1);
        let Some(index) = counterpart_index else {
            return ExactPhaseEnd::NoCounterpart;
        };

        let candidate = singleton(rows[0].clone(), rows[index].clone());
        if let Err(deferral) = budget.admit(&candidate) {
            debug!(orders = ?deferral.order_ids, parties = deferral.parties, "exact match deferred");
            deferrals.push(deferral);
            return ExactPhaseEnd::PartyCap;
        }
        rows.remove(index);
        rows.remove(0);
        matches.push(candidate);
    }
    ExactPhaseEnd::Exhausted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{buy, ids, sell};

    fn run(rows: &mut Vec<Order>, cap: usize) -> (Vec<Match>, Vec<Deferral>, ExactPhaseEnd) {
        let mut budget = PartyBudget::new(cap);
        let mut matches = Vec::new();
        let mut deferrals = Vec::new();
        let end = find_exact_matches(rows, &mut budget, &mut matches, &mut deferrals);
        (matches, deferrals, end)
    }

    #[test]
    fn test_single_exact_match() {
        let mut rows = vec![sell(1, 100, 10), buy(2, 100, 10)];
        let (matches, _, end) = run(&mut rows, 16);
        assert_eq!(end, ExactPhaseEnd::Exhausted);
        assert_eq!(matches.len(), 1);
        assert_eq!(ids(&matches[0].buy), vec![2]);
        assert_eq!(ids(&matches[0].sell), vec![1]);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_skips_non_crossing_and_unequal() {
        let mut rows = vec![buy(1, 64, 10), sell(2, 32, 9), sell(3, 64, 11), sell(4, 64, 10), buy(5, 32, 10)];
        let (matches, _, end) = run(&mut rows, 16);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].order_ids().iter().map(|i| i.get()).collect::<Vec<_>>(), vec![1, 4]);
        assert_eq!(matches[1].order_ids().iter().map(|i| i.get()).collect::<Vec<_>>(), vec![5, 2]);
        // sell 3 is alone
        assert_eq!(end, ExactPhaseEnd::Exhausted);
        assert_eq!(ids(&rows), vec![3]);
    }

    #[test]
    fn test_head_without_counterpart_falls_through() {
        let mut rows = vec![buy(1, 100, 10), sell(2, 60, 10), sell(3, 40, 10)];
        let (matches, _, end) = run(&mut rows, 16);
        assert!(matches.is_empty());
        assert_eq!(end, ExactPhaseEnd::NoCounterpart);
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_budget_stops_phase() {
        let mut rows = vec![buy(1, 8, 10), sell(2, 8, 10), buy(3, 8, 10), sell(4, 8, 10)];
        let (matches, deferrals, end) = run(&mut rows, 3);
        assert_eq!(matches.len(), 1);
        assert_eq!(end, ExactPhaseEnd::PartyCap);
        assert_eq!(deferrals.len(), 1);
        assert_eq!(ids(&rows), vec![3, 4]);
    }

    #[test]
    fn test_idempotent_on_same_input() {
        let input = vec![buy(1, 8, 10), sell(2, 4, 10), sell(3, 8, 9), buy(4, 4, 11), sell(5, 8, 10)];
        let (mut a, mut b) = (input.clone(), input);
        let (first, _, _) = run(&mut a, 16);
        let (second, _, _) = run(&mut b, 16);
        assert_eq!(first, second);
        assert_eq!(a, b);
    }
}
