//! Order fees
//!
//! Every lot pays a flat fee in the base asset, at least `MIN_FEE`. Fees are
//! the sole priority signal between orders at valid prices: matching visits
//! higher-fee orders first.

use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::ids::Address;
use crate::numeric::Amount;

/// Minimum fee per lot, in base-asset units
pub const MIN_FEE: Amount = 1000;

/// Seconds after which a requester may reclaim an unmatched escrow
pub const ORDER_TERM_SECS: i64 = 3600;

/// A payment the requester must make to fund one lot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInstruction {
    pub address: Address,
    pub asset: Asset,
    pub amount: Amount,
}

/// Payments funding one lot's escrow.
///
/// A base-asset deposit carries the fee on top of `in_amount` in the same
/// output. Any other asset is paid exactly, with the fee as a separate
/// base-asset payment to the same address.
pub fn funding_payments(
    order_address: &Address,
    in_asset: &Asset,
    in_amount: Amount,
    fee: Amount,
) -> Vec<PaymentInstruction> {
    match in_asset {
        Asset::Base => vec![PaymentInstruction {
            address: order_address.clone(),
            asset: Asset::Base,
            amount: in_amount + fee,
        }],
        Asset::Issued(_) => vec![
            PaymentInstruction {
                address: order_address.clone(),
                asset: in_asset.clone(),
                amount: in_amount,
            },
            PaymentInstruction {
                address: order_address.clone(),
                asset: Asset::Base,
                amount: fee,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_deposit_carries_fee_inline() {
        let address = Address::from("ESCROW");
        let payments = funding_payments(&address, &Asset::Base, 5000, MIN_FEE);
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount, 6000);
    }

    #[test]
    fn test_issued_deposit_pays_fee_separately() {
        let address = Address::from("ESCROW");
        let payments = funding_payments(&address, &Asset::issued("GOLD"), 64, 2000);
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].asset, Asset::issued("GOLD"));
        assert_eq!(payments[0].amount, 64);
        assert_eq!(payments[1].asset, Asset::Base);
        assert_eq!(payments[1].amount, 2000);
    }
}
