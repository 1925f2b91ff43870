use serde::{Deserialize, Serialize};
use types::ids::{DeviceAddress, UnitId};
use types::numeric::Amount;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinimumFeeResponse {
    pub min_fee: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorReadyResponse {
    pub ready: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookQuery {
    pub device: Option<DeviceAddress>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub amount: Amount,
    pub fee: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransactionsRequest {
    pub units: Vec<UnitId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StableRequest {
    pub mci: u64,
}
