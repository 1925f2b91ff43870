//! Lot decomposition
//!
//! A requested amount is split into standard lots, one per set bit of its
//! binary representation, largest first. Two requests for the same amount
//! therefore decompose into the same lot sequence, which is what makes the
//! exact-match phase of the engine effective.

use crate::numeric::Amount;

/// Split `amount` into strictly decreasing powers of two summing to `amount`.
///
/// A zero amount yields no lots; intake rejects it before calling this.
pub fn decompose(amount: Amount) -> Vec<Amount> {
    (0..Amount::BITS)
        .rev()
        .map(|bit| 1 << bit)
        .filter(|lot| (amount & lot) != 0)
        .collect()
}

/// Number of lots (and therefore of escrows and fees) for `amount`.
pub fn lot_count(amount: Amount) -> usize {
    amount.count_ones() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decompose_thirteen() {
        assert_eq!(decompose(13), vec![8, 4, 1]);
    }

    #[test]
    fn test_decompose_power_of_two_is_single_lot() {
        assert_eq!(decompose(1024), vec![1024]);
        assert_eq!(lot_count(1024), 1);
    }

    #[test]
    fn test_decompose_zero_is_empty() {
        assert!(decompose(0).is_empty());
    }

    #[test]
    fn test_decompose_max() {
        let lots = decompose(u64::MAX);
        assert_eq!(lots.len(), 64);
        assert_eq!(lots[0], 1 << 63);
    }

    proptest! {
        #[test]
        fn prop_lots_sum_to_amount(amount in 1u64..=u64::MAX) {
            let lots = decompose(amount);
            let sum: u128 = lots.iter().map(|&l| l as u128).sum();
            prop_assert_eq!(sum, amount as u128);
            prop_assert_eq!(lots.len(), lot_count(amount));
        }

        #[test]
        fn prop_lots_strictly_decreasing_powers_of_two(amount in 1u64..=u64::MAX) {
            let lots = decompose(amount);
            prop_assert!(lots.iter().all(|l| l.is_power_of_two()));
            prop_assert!(lots.windows(2).all(|w| w[0] > w[1]));
        }
    }
}
