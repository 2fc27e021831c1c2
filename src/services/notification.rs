//! Provider notification intake
//!
//! Parses webhook payloads from the provider and turns them into work:
//! queued syncs or item status changes. The provider always gets an
//! acknowledgement back; failures are logged here and go no further.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::models::ItemStatus;
use crate::services::item::ItemService;
use crate::storage::Storage;
use crate::sync::{SyncHandle, SyncTrigger};

/// Error details attached to `ITEM` / `ERROR` notifications
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationError {
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    pub webhook_type: String,
    pub webhook_code: String,
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub error: Option<NotificationError>,
}

/// Response returned to the provider for every notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Acknowledgement {
    pub status: &'static str,
}

impl Acknowledgement {
    pub fn received() -> Self {
        Self { status: "received" }
    }
}

/// What a notification led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    SyncQueued,
    StatusChanged(ItemStatus),
    Ignored,
}

pub struct NotificationIntake {
    storage: Arc<Storage>,
    sync: SyncHandle,
}

impl NotificationIntake {
    pub fn new(storage: Arc<Storage>, sync: SyncHandle) -> Self {
        Self { storage, sync }
    }

    /// Handle a raw JSON payload
    pub fn handle_json(&self, body: &str) -> Acknowledgement {
        match serde_json::from_str::<Notification>(body) {
            Ok(notification) => self.handle(&notification),
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable notification");
                Acknowledgement::received()
            }
        }
    }

    /// Handle a notification, logging any failure
    pub fn handle(&self, notification: &Notification) -> Acknowledgement {
        tracing::info!(
            webhook_type = %notification.webhook_type,
            webhook_code = %notification.webhook_code,
            item_id = ?notification.item_id,
            "Received notification"
        );

        match self.dispatch(notification) {
            Ok(outcome) => {
                tracing::debug!(outcome = ?outcome, "Notification handled");
            }
            Err(e) => {
                tracing::error!(
                    webhook_type = %notification.webhook_type,
                    webhook_code = %notification.webhook_code,
                    item_id = ?notification.item_id,
                    error = %e,
                    "Failed to handle notification"
                );
            }
        }
        Acknowledgement::received()
    }

    /// Route a notification to its handler
    pub fn dispatch(&self, notification: &Notification) -> LedgerResult<NotificationOutcome> {
        let kind = (
            notification.webhook_type.as_str(),
            notification.webhook_code.as_str(),
        );

        match kind {
            ("TRANSACTIONS", "SYNC_UPDATES_AVAILABLE") => {
                let item_id = self.known_item(notification)?;
                self.sync.enqueue(item_id, SyncTrigger::Notification)?;
                Ok(NotificationOutcome::SyncQueued)
            }
            ("ITEM", "ERROR") => {
                let item_id = self.known_item(notification)?;
                let reason = notification
                    .error
                    .as_ref()
                    .and_then(|e| e.error_code.clone().or_else(|| e.error_message.clone()))
                    .unwrap_or_else(|| "unknown error".to_string());
                let status = ItemStatus::LoginRequired { reason };
                ItemService::new(&self.storage).set_status(item_id, status.clone())?;
                Ok(NotificationOutcome::StatusChanged(status))
            }
            ("ITEM", "PENDING_EXPIRATION") => {
                let item_id = self.known_item(notification)?;
                ItemService::new(&self.storage).set_status(item_id, ItemStatus::PendingExpiration)?;
                Ok(NotificationOutcome::StatusChanged(ItemStatus::PendingExpiration))
            }
            _ => {
                tracing::info!(
                    webhook_type = %notification.webhook_type,
                    webhook_code = %notification.webhook_code,
                    "Ignoring notification"
                );
                Ok(NotificationOutcome::Ignored)
            }
        }
    }

    fn known_item<'n>(&self, notification: &'n Notification) -> LedgerResult<&'n str> {
        let item_id = notification
            .item_id
            .as_deref()
            .ok_or_else(|| LedgerError::Validation("Notification has no item_id".into()))?;

        if !self.storage.read(|state| state.items.contains(item_id))? {
            return Err(LedgerError::item_not_found(item_id));
        }
        Ok(item_id)
    }
}
