//! Ledger event loop
//!
//! Consumes ledger notifications in arrival order. Correlation and
//! activation run inline; matching passes run as tasks so slow settlements
//! on one pair never hold up events or other pairs.

use contracts::events::LedgerEvent;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, instrument, warn};
use types::ids::PairId;

use crate::coordinator::PassSummary;
use crate::error::ExchangeError;
use crate::exchange::Exchange;

type PassResult = Result<PassSummary, ExchangeError>;

impl Exchange {
    /// Handle one event; returns the pairs that need a matching pass.
    pub async fn dispatch(&self, event: LedgerEvent) -> Result<BTreeSet<PairId>, ExchangeError> {
        match event {
            LedgerEvent::NewTransactions { units } => {
                self.handle_new_transactions(&units).await?;
                Ok(BTreeSet::new())
            }
            LedgerEvent::Stabilized { mci } => self.handle_stabilized(mci).await,
        }
    }
}

/// Forward a fatal error to the node; returns whether the loop must stop.
async fn escalate(err: ExchangeError, fatal: &mpsc::Sender<ExchangeError>) -> bool {
    if err.is_fatal() {
        error!(error = %err, "invariant violated, stopping");
        let _ = fatal.send(err).await;
        true
    } else {
        warn!(error = %err, "event handling failed");
        false
    }
}

async fn finish_pass(joined: Result<PassResult, JoinError>, fatal: &mpsc::Sender<ExchangeError>) -> bool {
    match joined {
        Ok(Ok(summary)) => {
            if !summary.deals.is_empty() || summary.cancelled > 0 {
                info!(
                    deals = summary.deals.len(),
                    cancelled = summary.cancelled,
                    deferred = summary.deferred,
                    "matching run finished"
                );
            }
            false
        }
        Ok(Err(err)) => escalate(err, fatal).await,
        Err(join_err) => {
            error!(error = %join_err, "matching task panicked, stopping");
            true
        }
    }
}

/// Run until `events` closes or a fatal error is escalated. In-flight
/// matching passes are awaited before returning.
#[instrument(skip_all)]
pub async fn run_event_loop(
    exchange: Arc<Exchange>,
    mut events: mpsc::Receiver<LedgerEvent>,
    fatal: mpsc::Sender<ExchangeError>,
) {
    let mut passes: JoinSet<PassResult> = JoinSet::new();
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                info!(event = event.name(), "ledger event");
                match exchange.dispatch(event).await {
                    Ok(pairs) => {
                        for pair_id in pairs {
                            let exchange = exchange.clone();
                            passes.spawn(async move { exchange.match_pair(pair_id).await });
                        }
                    }
                    Err(err) => {
                        if escalate(err, &fatal).await {
                            passes.abort_all();
                            return;
                        }
                    }
                }
            }
            Some(joined) = passes.join_next(), if !passes.is_empty() => {
                if finish_pass(joined, &fatal).await {
                    passes.abort_all();
                    return;
                }
            }
        }
    }

    while let Some(joined) = passes.join_next().await {
        if finish_pass(joined, &fatal).await {
            passes.abort_all();
            return;
        }
    }
    info!("ledger event stream closed");
}
