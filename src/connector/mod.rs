//! Bank-aggregation provider connector
//!
//! The ledger talks to a provider only through the [`Connector`] trait:
//! "give me the next page of changes after this cursor" and "give me current
//! balances". Records crossing this boundary are typed and already use the
//! ledger's sign convention (inflow positive, outflow negative).

pub mod http;
pub mod scripted;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ConfidenceTier, Money, ProviderCategory, ProviderItem, SyncCursor};

pub use http::{HttpConnector, HttpConnectorConfig};
pub use scripted::ScriptedConnector;

#[derive(Debug, Clone, Error)]
pub enum ConnectorError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Balances as reported for one account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderBalances {
    #[serde(default)]
    pub current: Option<Money>,
    #[serde(default)]
    pub available: Option<Money>,
    #[serde(default)]
    pub limit: Option<Money>,
    #[serde(default)]
    pub iso_currency_code: Option<String>,
}

/// An account as reported by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderAccount {
    pub account_id: String,
    pub name: String,
    #[serde(default)]
    pub official_name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub balances: ProviderBalances,
}

/// A counterparty attached to a transaction record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counterparty {
    pub name: String,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub confidence: ConfidenceTier,
}

/// An added or modified transaction record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderTransaction {
    pub transaction_id: String,
    pub account_id: String,
    /// Signed amount, inflow positive
    pub amount: Money,
    pub date: NaiveDate,
    #[serde(default)]
    pub authorized_date: Option<NaiveDate>,
    #[serde(default)]
    pub datetime: Option<DateTime<Utc>>,
    pub name: String,
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub pending_transaction_id: Option<String>,
    #[serde(default)]
    pub payment_channel: Option<String>,
    #[serde(default)]
    pub category: ProviderCategory,
    #[serde(default)]
    pub counterparties: Vec<Counterparty>,
}

/// A removed transaction record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovedTransaction {
    pub transaction_id: String,
    #[serde(default)]
    pub account_id: Option<String>,
}

/// One page of changes after a cursor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncPage {
    #[serde(default)]
    pub added: Vec<ProviderTransaction>,
    #[serde(default)]
    pub modified: Vec<ProviderTransaction>,
    #[serde(default)]
    pub removed: Vec<RemovedTransaction>,
    #[serde(default)]
    pub accounts: Vec<ProviderAccount>,
    #[serde(default)]
    pub has_more: bool,
    pub next_cursor: Option<SyncCursor>,
}

#[async_trait]
pub trait Connector: Send + Sync {
    /// Fetch the page of changes following `cursor` (`None` for the first sync)
    async fn fetch_deltas(
        &self,
        item: &ProviderItem,
        cursor: Option<&SyncCursor>,
    ) -> Result<SyncPage, ConnectorError>;

    /// Fetch current balances for every account on the item
    async fn fetch_balances(
        &self,
        item: &ProviderItem,
    ) -> Result<Vec<ProviderAccount>, ConnectorError>;

    fn name(&self) -> &'static str;
}
