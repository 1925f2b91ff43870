//! Crossed part of the book
//!
//! Only orders priced between the lowest sell and the highest buy can take
//! part in a match. They are visited by fee descending, then by creation
//! time, which is the book's only priority rule.

use std::cmp::Reverse;
use types::numeric::IntPrice;
use types::order::{Order, OrderType};

use crate::matching::crossing::can_match;

/// Best bid and best ask among active orders.
pub fn best_bid_ask(orders: &[Order]) -> (Option<IntPrice>, Option<IntPrice>) {
    let active = || orders.iter().filter(|o| o.is_active());
    let bid = active()
        .filter(|o| o.order_type == OrderType::Buy)
        .map(|o| o.int_price)
        .max();
    let ask = active()
        .filter(|o| o.order_type == OrderType::Sell)
        .map(|o| o.int_price)
        .min();
    (bid, ask)
}

/// `(min sell, max buy)` when the book is crossed.
pub fn crossing_range(orders: &[Order]) -> Option<(IntPrice, IntPrice)> {
    match best_bid_ask(orders) {
        (Some(bid), Some(ask)) if can_match(bid, ask) => Some((ask, bid)),
        _ => None,
    }
}

/// Active orders inside the crossing range in matching priority.
pub fn select_crossed(orders: &[Order]) -> Vec<Order> {
    let Some((low, high)) = crossing_range(orders) else {
        return Vec::new();
    };
    let mut rows: Vec<Order> = orders
        .iter()
        .filter(|o| o.is_active() && (low..=high).contains(&o.int_price))
        .cloned()
        .collect();
    rows.sort_by_key(|o| (Reverse(o.fee), o.creation_date, o.order_id));
    rows
}
