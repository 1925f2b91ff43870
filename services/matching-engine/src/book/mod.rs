//! Order book views
//!
//! The book is the set of active orders of a pair held by the store; these
//! modules derive the views matching and the query surface need from it.

pub mod crossed;
pub mod depth;

pub use crossed::{best_bid_ask, crossing_range, select_crossed};
pub use depth::{aggregate, BookLevel};
