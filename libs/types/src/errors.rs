//! Error types for the exchange core
//!
//! Two families: user-input errors reported back to the requester, and
//! invariant violations that indicate an accounting or logic defect and must
//! halt processing rather than produce an incorrect settlement.

use thiserror::Error;

use crate::ids::{OrderId, PairId};
use crate::numeric::Amount;

/// Errors caused by a request or by the state of a single order
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderError {
    #[error("Pair not found: {pair_id}")]
    PairNotFound { pair_id: PairId },

    #[error("Pair {pair_id} is delisted")]
    PairDelisted { pair_id: PairId },

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount {amount} is not a multiple of the pair increment {increment}")]
    AmountIncrement { amount: Amount, increment: Amount },

    #[error("Fee {fee} is below the minimum {min_fee}")]
    FeeBelowMinimum { fee: Amount, min_fee: Amount },

    #[error("Invalid destination address: {address}")]
    InvalidDestination { address: String },

    #[error("Address already used, please try again: {address}")]
    AddressReuse { address: String },

    #[error("Invalid state transition of order {order_id} from {from} to {to}")]
    InvalidStateTransition { order_id: OrderId, from: String, to: String },

    #[error("The exchange is not ready yet, try again in a few minutes")]
    OperatorNotReady,
}

/// Accounting or matching-logic defects
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("Balance < 0 for asset {asset}: inputs {inputs}, outputs {outputs}")]
    NegativeBalance { asset: String, inputs: Amount, outputs: Amount },

    #[error("Matching trapped in cycle with {remaining} orders left")]
    Starvation { remaining: usize },

    #[error("Unbalanced match: buy {buy}, sell {sell}")]
    UnbalancedMatch { buy: Amount, sell: Amount },

    #[error("Match without counterparties")]
    EmptyMatch,

    #[error("Sought amount overshot by counterparties of order {order_id}")]
    SoughtOvershoot { order_id: OrderId },

    #[error("Order {order_id} pays its fee inside a non-base {asset} output")]
    FeeOutputMismatch { order_id: OrderId, asset: String },

    #[error("Missing {table} row {id}")]
    MissingRow { table: &'static str, id: String },

    #[error("Amount overflow while totalling {asset}")]
    Overflow { asset: String },
}
