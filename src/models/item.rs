//! Provider item model
//!
//! An item is one linked login at a bank-aggregation provider. It owns the
//! sync cursor for all accounts reached through that login.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque provider token marking the last applied page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncCursor(String);

impl SyncCursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SyncCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Health of a provider item as last reported by notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Healthy,
    /// The provider needs the user to log in again
    LoginRequired { reason: String },
    /// Consent expires soon
    PendingExpiration,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::LoginRequired { reason } => write!(f, "login required ({})", reason),
            Self::PendingExpiration => write!(f, "pending expiration"),
        }
    }
}

/// A linked provider login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderItem {
    /// Provider-issued item id
    pub item_id: String,

    pub access_token: String,

    #[serde(default)]
    pub institution_id: Option<String>,

    #[serde(default)]
    pub institution_name: Option<String>,

    /// Cursor after the last committed sync; `None` before the first sync
    #[serde(default)]
    pub cursor: Option<SyncCursor>,

    #[serde(default)]
    pub last_synced: Option<DateTime<Utc>>,

    #[serde(default)]
    pub status: ItemStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProviderItem {
    /// Register a new item
    pub fn new(item_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            item_id: item_id.into(),
            access_token: access_token.into(),
            institution_id: None,
            institution_name: None,
            cursor: None,
            last_synced: None,
            status: ItemStatus::Healthy,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a committed sync
    pub fn mark_synced(&mut self, cursor: Option<SyncCursor>, at: DateTime<Utc>) {
        if cursor.is_some() {
            self.cursor = cursor;
        }
        self.last_synced = Some(at);
        self.status = ItemStatus::Healthy;
        self.updated_at = at;
    }

    pub fn set_status(&mut self, status: ItemStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

impl fmt::Display for ProviderItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.institution_name {
            Some(name) => write!(f, "{} ({})", self.item_id, name),
            None => write!(f, "{}", self.item_id),
        }
    }
}
