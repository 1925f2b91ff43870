//! Pair matching coordinator
//!
//! At most one matching-and-settlement pass runs per pair; pairs proceed in
//! parallel. Each pass first drops orders whose escrow was spent outside
//! the exchange, then matches and settles, looping while the engine says a
//! capped pass may have left crossable orders behind.

use chrono::Utc;
use dashmap::DashMap;
use persistence::SettlementRecord;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};
use types::ids::{OrderId, OutputRef, PairId};

use crate::error::{ErrorClass, ExchangeError};
use crate::exchange::Exchange;
use crate::settlement::SettlementReport;

/// Named per-pair mutexes, created on first use
#[derive(Debug, Default)]
pub struct PairLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl PairLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_name(pair_id: PairId) -> String {
        format!("match-{}", pair_id)
    }

    pub fn lock_for(&self, pair_id: PairId) -> Arc<Mutex<()>> {
        self.locks
            .entry(Self::lock_name(pair_id))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// What one coordinator run over a pair did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub passes: usize,
    pub cancelled: usize,
    pub deferred: usize,
    pub deals: Vec<SettlementReport>,
    /// A collaborator failure ended the run; orders stay active
    pub alert: Option<String>,
}

impl Exchange {
    /// Cancel active orders of `pair_id` whose funding or fee output is spent.
    pub async fn cancel_spent_orders(&self, pair_id: PairId) -> Result<usize, ExchangeError> {
        let active = self.store.active_orders(pair_id)?;
        if active.is_empty() {
            return Ok(0);
        }
        let refs: Vec<OutputRef> = active
            .iter()
            .flat_map(|o| [o.funding.clone(), o.fee_funding.clone()])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let spent = self.ledger.spent_outputs(&refs).await?;
        if spent.is_empty() {
            return Ok(0);
        }
        let reclaimed: Vec<OrderId> = active
            .iter()
            .filter(|o| spent.contains(&o.funding) || spent.contains(&o.fee_funding))
            .map(|o| o.order_id)
            .collect();

        let cancelled = self.store.cancel_orders(&reclaimed, Utc::now())?;
        info!(pair_id = %pair_id, cancelled, "orders with spent escrow cancelled");
        let record = SettlementRecord::OrdersCancelled {
            pair_id,
            order_ids: reclaimed,
        };
        if let Err(err) = self.journal(&record) {
            error!(pair_id = %pair_id, error = %err, "journal write failed");
        }
        Ok(cancelled)
    }

    /// Run matching for `pair_id` under its lock until nothing more settles.
    ///
    /// Collaborator failures end the run with an alert; only invariant
    /// violations are returned as errors.
    #[instrument(skip(self))]
    pub async fn match_pair(&self, pair_id: PairId) -> Result<PassSummary, ExchangeError> {
        let mut summary = PassSummary::default();
        let Some(operator) = self.operator.get().cloned() else {
            info!("operator not ready, matching skipped");
            return Ok(summary);
        };

        let lock = self.pair_locks.lock_for(pair_id);
        let _guard = lock.lock().await;
        let pair = self.store.pair(pair_id)?;

        loop {
            summary.passes += 1;
            let outcome = match self.cancel_spent_orders(pair_id).await {
                Ok(cancelled) => {
                    summary.cancelled += cancelled;
                    let active = self.store.active_orders(pair_id)?;
                    self.engine.find_matches(&active)?
                }
                Err(err) if err.class() == ErrorClass::Collaborator => {
                    warn!(error = %err, "pair alert: spent-escrow check failed");
                    summary.alert = Some(err.to_string());
                    break;
                }
                Err(err) => return Err(err),
            };
            summary.deferred += outcome.deferrals.len();
            if outcome.is_empty() {
                break;
            }

            match self.settle(&pair, &outcome.matches, &operator).await {
                Ok(report) => summary.deals.push(report),
                Err(err) if err.class() == ErrorClass::Collaborator => {
                    error!(error = %err, "pair alert: settlement abandoned");
                    summary.alert = Some(err.to_string());
                    break;
                }
                Err(err) => return Err(err),
            }

            if !self.engine.should_rerun(&outcome) {
                break;
            }
            info!(
                authors = outcome.authors,
                cap = self.engine.max_authors(),
                deferred = outcome.deferrals.len(),
                "rerunning capped pass"
            );
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_names_and_reuse() {
        let locks = PairLocks::new();
        assert_eq!(PairLocks::lock_name(PairId::new(7)), "match-7");
        let a = locks.lock_for(PairId::new(7));
        let b = locks.lock_for(PairId::new(7));
        let c = locks.lock_for(PairId::new(8));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[tokio::test]
    async fn test_pair_lock_serializes() {
        let locks = PairLocks::new();
        let lock = locks.lock_for(PairId::new(1));
        let guard = lock.lock().await;
        assert!(locks.lock_for(PairId::new(1)).try_lock().is_err());
        assert!(locks.lock_for(PairId::new(2)).try_lock().is_ok());
        drop(guard);
        assert!(locks.lock_for(PairId::new(1)).try_lock().is_ok());
    }
}
