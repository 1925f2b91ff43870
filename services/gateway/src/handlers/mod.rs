pub mod ledger;
pub mod market;
pub mod order;
