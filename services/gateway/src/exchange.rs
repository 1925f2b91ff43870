//! The exchange node's shared components
//!
//! One [`Exchange`] is shared by the HTTP handlers and the ledger event
//! loop. Intake, correlation, coordination and settlement are implemented
//! as methods on it in their own modules.

use contracts::ledger::Ledger;
use matching_engine::MatchingEngine;
use persistence::journal::JournalError;
use persistence::{ExchangeStore, JournalWriter, SettlementRecord};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::config::GatewayConfig;
use crate::coordinator::PairLocks;
use crate::error::ExchangeError;
use crate::notify::Notifier;
use crate::operator::OperatorCell;

pub struct Exchange {
    pub(crate) config: GatewayConfig,
    pub(crate) store: Arc<dyn ExchangeStore>,
    pub(crate) ledger: Arc<dyn Ledger>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) operator: OperatorCell,
    pub(crate) engine: MatchingEngine,
    pub(crate) pair_locks: PairLocks,
    /// Held by deposit writers; acquired and released by readers as a barrier
    pub(crate) write: AsyncMutex<()>,
    journal: Option<Mutex<JournalWriter>>,
}

impl Exchange {
    pub fn new(
        config: GatewayConfig,
        store: Arc<dyn ExchangeStore>,
        ledger: Arc<dyn Ledger>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let engine = MatchingEngine::new(config.max_authors_per_unit);
        Self {
            config,
            store,
            ledger,
            notifier,
            operator: OperatorCell::new(),
            engine,
            pair_locks: PairLocks::new(),
            write: AsyncMutex::new(()),
            journal: None,
        }
    }

    /// Open the settlement journal configured by `journal_dir`, if any.
    pub fn with_configured_journal(self) -> Result<Self, JournalError> {
        match self.config.journal_dir.clone() {
            Some(dir) => Ok(self.with_journal(JournalWriter::open(&dir)?)),
            None => Ok(self),
        }
    }

    pub fn with_journal(mut self, journal: JournalWriter) -> Self {
        self.journal = Some(Mutex::new(journal));
        self
    }

    pub fn with_operator(mut self, operator: OperatorCell) -> Self {
        self.operator = operator;
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ExchangeStore> {
        &self.store
    }

    pub fn min_fee(&self) -> u64 {
        self.config.min_fee
    }

    /// Whether the operator context is resolved, retrying resolution if not.
    pub async fn is_operator_ready(&self) -> Result<bool, ExchangeError> {
        Ok(self.operator.resolve(self.ledger.as_ref()).await?.is_some())
    }

    pub(crate) fn journal(&self, record: &SettlementRecord) -> Result<(), ExchangeError> {
        let Some(journal) = &self.journal else {
            return Ok(());
        };
        let mut writer = journal.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = writer.write_record(chrono::Utc::now().timestamp_millis(), record)?;
        debug!(sequence = entry.sequence, event = record.event_type(), "journal entry written");
        Ok(())
    }
}
