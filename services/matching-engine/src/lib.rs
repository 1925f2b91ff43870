//! Matching Engine Service
//!
//! Pairs active orders of one trading pair into balanced matches that a
//! single settlement transaction can carry.
//!
//! **Algorithm:**
//! - Only the crossed part of the book is considered, visited by fee
//!   descending then creation time
//! - Exact phase: equal-amount opposite orders paired one to one
//! - Sum phase: an anchor order filled exactly by several smaller
//!   counterparts
//!
//! **Key Invariants:**
//! - Every match balances: `sum(buy.amount) == sum(sell.amount)`
//! - Every pair in a match crosses: `sell.int_price <= buy.int_price`
//! - Distinct authors across a pass never exceed the party cap
//! - Deterministic: same active set, same matches

pub mod book;
pub mod matching;
pub mod engine;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{MatchOutcome, MatchingEngine};
pub use matching::budget::{Deferral, DeferralReason, PartyBudget};
