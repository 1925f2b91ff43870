//! Settlement execution
//!
//! Plan, compose and sign, record, broadcast, notify. Recording happens
//! before broadcast so a broadcast failure never leaves filled orders
//! looking active.

use chrono::Utc;
use contracts::settlement::plan_settlement;
use persistence::SettlementRecord;
use std::collections::BTreeMap;
use tracing::{error, info, instrument};
use types::asset::Asset;
use types::deal::Match;
use types::ids::{DealId, UnitId};
use types::numeric::Amount;
use types::pair::TradingPair;

use crate::error::ExchangeError;
use crate::exchange::Exchange;
use crate::notify::Notification;
use crate::operator::OperatorContext;

/// What one settled deal did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementReport {
    pub deal_id: DealId,
    pub unit: UnitId,
    pub matches: usize,
    pub orders: usize,
    pub authors: usize,
    /// Spread captured by the operator, per non-base asset
    pub operator_residuals: BTreeMap<Asset, Amount>,
}

impl Exchange {
    /// Settle `matches` of `pair` in one transfer.
    #[instrument(skip_all, fields(pair_id = %pair.pair_id, matches = matches.len()))]
    pub async fn settle(
        &self,
        pair: &TradingPair,
        matches: &[Match],
        operator: &OperatorContext,
    ) -> Result<SettlementReport, ExchangeError> {
        let plan = plan_settlement(pair, matches, &operator.fee_address)?;
        let composed = self
            .ledger
            .compose_and_sign(plan.request.clone())
            .await
            .map_err(|source| ExchangeError::Compose {
                pair_id: pair.pair_id,
                source,
            })?;

        let recorded = self
            .store
            .record_settlement(&composed.unit, &plan.match_order_ids, Utc::now())?;

        let record = SettlementRecord::DealRecorded {
            pair_id: pair.pair_id,
            deal_id: recorded.deal.deal_id,
            unit: composed.unit.clone(),
            matches: recorded
                .matches
                .iter()
                .map(|m| (m.match_id, m.order_ids.clone()))
                .collect(),
        };
        if let Err(err) = self.journal(&record) {
            error!(deal_id = %recorded.deal.deal_id, error = %err, "journal write failed");
        }

        self.ledger.broadcast(&composed.unit).await?;
        for device in &plan.device_addresses {
            self.notifier
                .notify(device, Notification::Settled { unit: composed.unit.clone() })
                .await;
        }

        let report = SettlementReport {
            deal_id: recorded.deal.deal_id,
            unit: composed.unit,
            matches: recorded.matches.len(),
            orders: plan.order_ids().count(),
            authors: composed.authors.len(),
            operator_residuals: plan.operator_residuals,
        };
        info!(
            deal_id = %report.deal_id,
            unit = %report.unit,
            matches = report.matches,
            authors = report.authors,
            "deal settled"
        );
        Ok(report)
    }
}
