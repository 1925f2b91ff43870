//! Notifications to participants' devices
//!
//! Delivery belongs to the conversational collaborator; the node only
//! decides what to say and to whom.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use tracing::info;
use types::asset::Asset;
use types::ids::{DeviceAddress, UnitId};
use types::numeric::Amount;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// Funding seen but not yet final
    DepositReceived { asset: Asset, amount: Amount, lots: usize },
    OrdersActivated { count: usize },
    Settled { unit: UnitId },
}

impl Notification {
    pub fn message(&self) -> String {
        match self {
            Notification::DepositReceived { asset, amount, lots } => format!(
                "Received your payment of {} {} for {} lot(s), it will be added to the book after the transaction is final",
                amount,
                asset_name(asset),
                lots
            ),
            Notification::OrdersActivated { count } => format!("{} order(s) added to the book", count),
            Notification::Settled { unit } => format!("Exchange transaction {}", unit),
        }
    }
}

fn asset_name(asset: &Asset) -> &str {
    match asset {
        Asset::Base => "base",
        Asset::Issued(id) => id.as_str(),
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, device: &DeviceAddress, notification: Notification);
}

/// Writes notifications to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, device: &DeviceAddress, notification: Notification) {
        info!(device = %device, message = %notification.message(), "notify");
    }
}

/// Keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(DeviceAddress, Notification)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(DeviceAddress, Notification)> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn sent_to(&self, device: &DeviceAddress) -> Vec<Notification> {
        self.sent()
            .into_iter()
            .filter(|(d, _)| d == device)
            .map(|(_, n)| n)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, device: &DeviceAddress, notification: Notification) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((device.clone(), notification));
    }
}
