//! Crossing detection logic
//!
//! Determines when a bid and ask can match based on integer price
//! compatibility. Display prices are never compared.

use types::numeric::IntPrice;
use types::order::{Order, OrderType};

/// A buy priced at `bid` can take a sell priced at `ask`.
pub fn can_match(bid: IntPrice, ask: IntPrice) -> bool {
    bid >= ask
}

/// Check if a candidate counterpart can join a match anchored at `anchor`.
///
/// Orders of the same side never match each other.
pub fn counterpart_crosses(anchor: &Order, candidate: &Order) -> bool {
    match (anchor.order_type, candidate.order_type) {
        (OrderType::Buy, OrderType::Sell) => can_match(anchor.int_price, candidate.int_price),
        (OrderType::Sell, OrderType::Buy) => can_match(candidate.int_price, anchor.int_price),
        _ => false,
    }
}
