//! Book views over a pair's active orders, in display prices.

use matching_engine::book::{aggregate, best_bid_ask};
use rust_decimal::Decimal;
use serde::Serialize;
use types::ids::{DeviceAddress, PairId};
use types::numeric::Amount;
use types::order::OrderType;

use crate::error::ExchangeError;
use crate::exchange::Exchange;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BidAsk {
    pub pair_id: PairId,
    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub order_type: OrderType,
    pub amount: Amount,
    pub order_count: usize,
}

impl Exchange {
    /// Highest active bid and lowest active ask.
    pub fn best_bid_ask(&self, pair_id: PairId) -> Result<BidAsk, ExchangeError> {
        let pair = self.trading_pair(pair_id)?;
        let active = self.store.active_orders(pair_id)?;
        let (bid, ask) = best_bid_ask(&active);
        Ok(BidAsk {
            pair_id,
            bid: bid.map(|p| pair.display_price(p)),
            ask: ask.map(|p| pair.display_price(p)),
        })
    }

    /// Active orders by price level, highest price first, optionally only one device's.
    pub fn book(&self, pair_id: PairId, device: Option<&DeviceAddress>) -> Result<Vec<PriceLevel>, ExchangeError> {
        let pair = self.trading_pair(pair_id)?;
        let active = self.store.active_orders(pair_id)?;
        Ok(aggregate(&active, device)
            .into_iter()
            .map(|level| PriceLevel {
                price: pair.display_price(level.int_price),
                order_type: level.order_type,
                amount: level.amount,
                order_count: level.order_count,
            })
            .collect())
    }
}
