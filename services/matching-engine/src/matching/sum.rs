//! Sum-match phase
//!
//! Each pass of the loop anchors on the larger head of the two sides and
//! fills it greedily from the other side, largest counterparts first. An
//! anchor that cannot be filled exactly is dropped for this pass.

use std::cmp::Reverse;
use tracing::debug;
use types::deal::Match;
use types::errors::InvariantViolation;
use types::order::{Order, OrderType};

use super::budget::{Deferral, PartyBudget};
use super::crossing::counterpart_crosses;

fn sort_by_amount_then_fee(orders: &mut [Order]) {
    // stable: equal (amount, fee) keep their priority order
    orders.sort_by_key(|o| (Reverse(o.amount), Reverse(o.fee)));
}

/// Fill anchors with sums of counterparts until one side runs out.
pub fn find_sum_matches(
    rows: Vec<Order>,
    budget: &mut PartyBudget,
    deferrals: &mut Vec<Deferral>,
) -> Result<Vec<Match>, InvariantViolation> {
    let (mut sellers, mut buyers): (Vec<Order>, Vec<Order>) =
        rows.into_iter().partition(|o| o.order_type == OrderType::Sell);
    let mut matches = Vec::new();
    if sellers.is_empty() || buyers.is_empty() {
        return Ok(matches);
    }
    sort_by_amount_then_fee(&mut sellers);
    sort_by_amount_then_fee(&mut buyers);

    // every iteration drops at least the anchor
    let mut work = sellers.len() + buyers.len();
    while !sellers.is_empty() && !buyers.is_empty() {
        work = work.checked_sub(1).ok_or(InvariantViolation::Starvation {
            remaining: sellers.len() + buyers.len(),
        })?;

        let sellers_first = sellers[0].amount > buyers[0].amount;
        let (first, second) = if sellers_first {
            (&mut sellers, &mut buyers)
        } else {
            (&mut buyers, &mut sellers)
        };
        let anchor = first.remove(0);

        let mut sought = anchor.amount;
        let mut used = Vec::new();
        for (i, row) in second.iter().enumerate() {
            if sought == 0 {
                break;
            }
            if row.amount > sought || !counterpart_crosses(&anchor, row) {
                continue;
            }
            sought = sought
                .checked_sub(row.amount)
                .ok_or(InvariantViolation::SoughtOvershoot { order_id: anchor.order_id })?;
            used.push(i);
        }
        if sought != 0 {
            debug!(order_id = %anchor.order_id, unfilled = sought, "anchor dropped");
            continue;
        }
        if used.is_empty() {
            return Err(InvariantViolation::EmptyMatch);
        }

        let counterparts: Vec<Order> = used.iter().map(|&i| second[i].clone()).collect();
        let candidate = match anchor.order_type {
            OrderType::Buy => Match::new(vec![anchor], counterparts),
            OrderType::Sell => Match::new(counterparts, vec![anchor]),
        };
        if let Err(deferral) = budget.admit(&candidate) {
            debug!(orders = ?deferral.order_ids, parties = deferral.parties, "sum match deferred");
            deferrals.push(deferral);
            continue;
        }
        for &i in used.iter().rev() {
            second.remove(i);
        }
        matches.push(candidate);
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{buy, ids, order, sell};

    fn run(rows: Vec<Order>, cap: usize) -> (Vec<Match>, Vec<Deferral>) {
        let mut budget = PartyBudget::new(cap);
        let mut deferrals = Vec::new();
        let matches = find_sum_matches(rows, &mut budget, &mut deferrals).unwrap();
        (matches, deferrals)
    }

    #[test]
    fn test_two_sells_fill_one_buy() {
        let (matches, _) = run(vec![sell(1, 60, 10), sell(2, 40, 10), buy(3, 100, 10)], 16);
        assert_eq!(matches.len(), 1);
        assert_eq!(ids(&matches[0].buy), vec![3]);
        assert_eq!(ids(&matches[0].sell), vec![1, 2]);
        assert_eq!(matches[0].buy_amount(), matches[0].sell_amount());
    }

    #[test]
    fn test_equal_heads_anchor_on_buyers() {
        let (matches, _) = run(vec![sell(1, 64, 10), buy(2, 64, 10)], 16);
        assert_eq!(matches.len(), 1);
        assert_eq!(ids(&matches[0].buy), vec![2]);
    }

    #[test]
    fn test_skips_oversized_and_non_crossing_counterparts() {
        let rows = vec![
            buy(1, 12, 10),
            sell(2, 16, 9),  // larger than sought
            sell(3, 8, 11),  // does not cross
            sell(4, 8, 10),
            sell(5, 4, 10),
        ];
        let (matches, _) = run(rows, 16);
        // sell 2 anchors first and finds nothing; then buy 1 takes 4 and 5
        assert_eq!(matches.len(), 1);
        assert_eq!(ids(&matches[0].sell), vec![4, 5]);
    }

    #[test]
    fn test_unfillable_anchor_dropped() {
        let (matches, _) = run(vec![buy(1, 100, 10), sell(2, 64, 10), sell(3, 32, 10)], 16);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_fee_breaks_amount_ties() {
        let rows = vec![
            buy(1, 16, 10),
            sell(2, 8, 10),
            order(3, OrderType::Sell, 8, 10, 3000),
            order(4, OrderType::Sell, 8, 10, 2000),
        ];
        let (matches, _) = run(rows, 16);
        assert_eq!(ids(&matches[0].sell), vec![3, 4]);
    }

    #[test]
    fn test_party_cap_defers_anchor_and_keeps_counterparts() {
        let rows = vec![buy(1, 12, 10), buy(2, 8, 10), sell(3, 8, 10), sell(4, 4, 10)];
        let (matches, deferrals) = run(rows, 2);
        // buy 1 needs three parties; deferred, then buy 2 takes sell 3
        assert_eq!(deferrals.len(), 1);
        assert_eq!(deferrals[0].parties, 3);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].order_ids().iter().map(|i| i.get()).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_one_sided_input() {
        let (matches, _) = run(vec![buy(1, 8, 10), buy(2, 8, 10)], 16);
        assert!(matches.is_empty());
    }
}
