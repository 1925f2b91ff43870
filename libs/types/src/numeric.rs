//! Integer price and amount arithmetic
//!
//! Display prices are decimals chosen by users. Matching never compares them
//! directly: each pair scales a display price by its `price_multiplier` into
//! an integer comparison price, rounded half away from zero. Counter amounts
//! are computed from that integer price, never from the display price, and
//! rounded towards the exchange: what a buyer escrows rounds up, what a
//! seller is owed rounds down. Any order therefore pays at least what every
//! order it crosses is owed.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Ledger amount in the smallest unit of an asset
pub type Amount = u64;

/// Scaled integer comparison price
pub type IntPrice = u64;

fn round_to_u64(value: Decimal) -> Option<u64> {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
}

/// `round(price * multiplier)`, `None` on overflow or a negative result.
pub fn scale_price(price: Decimal, multiplier: u64) -> Option<IntPrice> {
    price
        .checked_mul(Decimal::from(multiplier))
        .and_then(round_to_u64)
}

/// Display price of an integer price.
pub fn unscale_price(int_price: IntPrice, multiplier: u64) -> Decimal {
    if multiplier == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(int_price) / Decimal::from(multiplier)).normalize()
}

/// Direction of a fractional counter amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

/// `amount * int_price / multiplier`: asset2 amount of `amount` of asset1.
pub fn counter_amount(amount: Amount, int_price: IntPrice, multiplier: u64, rounding: Rounding) -> Option<Amount> {
    if multiplier == 0 {
        return None;
    }
    let scaled = u128::from(amount).checked_mul(u128::from(int_price))?;
    let divisor = u128::from(multiplier);
    let counter = match rounding {
        Rounding::Down => scaled / divisor,
        Rounding::Up => scaled.div_ceil(divisor),
    };
    u64::try_from(counter).ok()
}
