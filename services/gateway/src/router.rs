use crate::handlers::{ledger, market, order};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/fees/minimum", get(market::minimum_fee))
        .route("/operator/ready", get(market::operator_ready))
        .route("/pairs/{id}", get(market::pair_properties))
        .route("/pairs/{id}/bid-ask", get(market::bid_ask))
        .route("/pairs/{id}/book", get(market::book))
        .route("/orders", post(order::place_order))
        .route("/orders/quote", post(order::quote_order))
        .route("/ledger/transactions", post(ledger::new_transactions))
        .route("/ledger/stable", post(ledger::stable));

    Router::new()
        .nest("/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
