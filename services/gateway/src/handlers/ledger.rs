//! Notifications from the ledger node, queued for the event loop.

use crate::error::AppError;
use crate::models::{NewTransactionsRequest, StableRequest};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use contracts::events::LedgerEvent;

async fn enqueue(state: &AppState, event: LedgerEvent) -> Result<StatusCode, AppError> {
    state
        .events
        .send(event)
        .await
        .map_err(|_| AppError::ServiceUnavailable("event loop stopped".into()))?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn new_transactions(
    State(state): State<AppState>,
    Json(payload): Json<NewTransactionsRequest>,
) -> Result<StatusCode, AppError> {
    if payload.units.is_empty() {
        return Err(AppError::BadRequest("no units".into()));
    }
    enqueue(&state, LedgerEvent::NewTransactions { units: payload.units }).await
}

pub async fn stable(State(state): State<AppState>, Json(payload): Json<StableRequest>) -> Result<StatusCode, AppError> {
    enqueue(&state, LedgerEvent::Stabilized { mci: payload.mci }).await
}
