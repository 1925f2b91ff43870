use crate::error::AppError;
use crate::market::{BidAsk, PriceLevel};
use crate::models::{BookQuery, MinimumFeeResponse, OperatorReadyResponse};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use types::ids::PairId;
use types::pair::TradingPair;

pub async fn minimum_fee(State(state): State<AppState>) -> Json<MinimumFeeResponse> {
    Json(MinimumFeeResponse {
        min_fee: state.exchange.min_fee(),
    })
}

pub async fn operator_ready(State(state): State<AppState>) -> Result<Json<OperatorReadyResponse>, AppError> {
    let ready = state.exchange.is_operator_ready().await?;
    Ok(Json(OperatorReadyResponse { ready }))
}

pub async fn pair_properties(
    State(state): State<AppState>,
    Path(pair_id): Path<PairId>,
) -> Result<Json<TradingPair>, AppError> {
    Ok(Json(state.exchange.trading_pair(pair_id)?))
}

pub async fn bid_ask(State(state): State<AppState>, Path(pair_id): Path<PairId>) -> Result<Json<BidAsk>, AppError> {
    Ok(Json(state.exchange.best_bid_ask(pair_id)?))
}

pub async fn book(
    State(state): State<AppState>,
    Path(pair_id): Path<PairId>,
    Query(query): Query<BookQuery>,
) -> Result<Json<Vec<PriceLevel>>, AppError> {
    Ok(Json(state.exchange.book(pair_id, query.device.as_ref())?))
}
