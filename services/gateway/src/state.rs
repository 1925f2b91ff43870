use contracts::events::LedgerEvent;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::exchange::Exchange;

#[derive(Clone)]
pub struct AppState {
    pub exchange: Arc<Exchange>,
    /// Feeds ledger notifications into the event loop
    pub events: mpsc::Sender<LedgerEvent>,
}

impl AppState {
    pub fn new(exchange: Arc<Exchange>, events: mpsc::Sender<LedgerEvent>) -> Self {
        Self { exchange, events }
    }
}
