//! Aggregated book depth
//!
//! Active orders grouped by `(price, side)`, highest price first. Uses a
//! BTreeMap so the output order is deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::cmp::Reverse;
use types::ids::DeviceAddress;
use types::numeric::{Amount, IntPrice};
use types::order::{Order, OrderType};

/// One aggregated price level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    pub int_price: IntPrice,
    pub order_type: OrderType,
    /// Total asset1 amount at this level
    pub amount: Amount,
    pub order_count: usize,
}

/// Aggregate active orders, optionally only those of one device.
pub fn aggregate(orders: &[Order], device: Option<&DeviceAddress>) -> Vec<BookLevel> {
    let mut levels: BTreeMap<(Reverse<IntPrice>, OrderType), BookLevel> = BTreeMap::new();
    for order in orders.iter().filter(|o| o.is_active()) {
        if device.is_some_and(|d| d != &order.device_address) {
            continue;
        }
        let level = levels
            .entry((Reverse(order.int_price), order.order_type))
            .or_insert_with(|| BookLevel {
                int_price: order.int_price,
                order_type: order.order_type,
                amount: 0,
                order_count: 0,
            });
        level.amount += order.amount;
        level.order_count += 1;
    }
    levels.into_values().collect()
}
