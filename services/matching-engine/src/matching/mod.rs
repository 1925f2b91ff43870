//! Matching logic module
//!
//! Exact pairing first, then summed fills, both under one party budget.

pub mod budget;
pub mod crossing;
pub mod exact;
pub mod sum;

pub use crossing::can_match;
