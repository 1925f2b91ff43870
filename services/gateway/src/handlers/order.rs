use crate::error::AppError;
use crate::intake::{quote, PlaceOrderRequest, PlacedOrder, Quote};
use crate::models::QuoteRequest;
use crate::state::AppState;
use axum::{extract::State, Json};

pub async fn place_order(
    State(state): State<AppState>,
    Json(payload): Json<PlaceOrderRequest>,
) -> Result<Json<PlacedOrder>, AppError> {
    Ok(Json(state.exchange.place_order(payload).await?))
}

pub async fn quote_order(Json(payload): Json<QuoteRequest>) -> Result<Json<Quote>, AppError> {
    if payload.amount == 0 {
        return Err(AppError::BadRequest("amount must be positive".into()));
    }
    Ok(Json(quote(payload.amount, payload.fee)))
}
