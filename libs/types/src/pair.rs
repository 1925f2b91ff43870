//! Trading pairs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::errors::OrderError;
use crate::ids::PairId;
use crate::numeric::{self, Amount, IntPrice};
use crate::order::OrderType;

/// Immutable description of a pair. Prices are quoted in asset2 per asset1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingPair {
    pub pair_id: PairId,
    pub asset1: Asset,
    pub asset2: Asset,
    /// Scales a display price into an integer comparison price
    pub price_multiplier: u64,
    /// Minimum tradable granularity of asset1
    pub amount_increment: Amount,
    pub delisted: bool,
}

impl TradingPair {
    /// Asset a requester deposits for an order of `order_type`.
    pub fn in_asset(&self, order_type: OrderType) -> &Asset {
        match order_type {
            OrderType::Buy => &self.asset2,
            OrderType::Sell => &self.asset1,
        }
    }

    /// Asset a requester receives when the order fills.
    pub fn out_asset(&self, order_type: OrderType) -> &Asset {
        match order_type {
            OrderType::Buy => &self.asset1,
            OrderType::Sell => &self.asset2,
        }
    }

    pub fn int_price(&self, price: Decimal) -> Result<IntPrice, OrderError> {
        if price <= Decimal::ZERO {
            return Err(OrderError::InvalidPrice(format!("{} is not positive", price)));
        }
        match numeric::scale_price(price, self.price_multiplier) {
            Some(int_price) if int_price > 0 => Ok(int_price),
            _ => Err(OrderError::InvalidPrice(format!(
                "{} is below the pair's price step 1/{}",
                price, self.price_multiplier
            ))),
        }
    }

    pub fn display_price(&self, int_price: IntPrice) -> Decimal {
        numeric::unscale_price(int_price, self.price_multiplier)
    }

    /// Check an asset1 amount against the pair's granularity.
    pub fn validate_amount(&self, amount: Amount) -> Result<(), OrderError> {
        if amount == 0 {
            return Err(OrderError::InvalidAmount("amount must be positive".to_string()));
        }
        if self.amount_increment > 1 && amount % self.amount_increment != 0 {
            return Err(OrderError::AmountIncrement {
                amount,
                increment: self.amount_increment,
            });
        }
        Ok(())
    }
}
