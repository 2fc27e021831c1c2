//! HTTP connector for a Plaid-style `/transactions/sync` API
//!
//! The provider reports outflows as positive decimals; amounts are negated
//! here so everything past this module is inflow-positive.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{
    Connector, ConnectorError, Counterparty, ProviderAccount, ProviderBalances,
    ProviderTransaction, RemovedTransaction, SyncPage,
};
use crate::models::{ConfidenceTier, Money, ProviderCategory, ProviderItem, SyncCursor};

const SYNC_PAGE_SIZE: u32 = 500;

/// Connection settings for [`HttpConnector`]
#[derive(Debug, Clone)]
pub struct HttpConnectorConfig {
    pub base_url: String,
    pub client_id: String,
    pub secret: String,
    pub timeout: Duration,
}

pub struct HttpConnector {
    config: HttpConnectorConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct SyncRequest<'a> {
    client_id: &'a str,
    secret: &'a str,
    access_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<&'a str>,
    count: u32,
}

#[derive(Debug, Serialize)]
struct BalanceRequest<'a> {
    client_id: &'a str,
    secret: &'a str,
    access_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct WireSyncResponse {
    #[serde(default)]
    added: Vec<WireTransaction>,
    #[serde(default)]
    modified: Vec<WireTransaction>,
    #[serde(default)]
    removed: Vec<WireRemoved>,
    #[serde(default)]
    accounts: Vec<WireAccount>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireBalanceResponse {
    #[serde(default)]
    accounts: Vec<WireAccount>,
}

#[derive(Debug, Deserialize)]
struct WireErrorBody {
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireTransaction {
    transaction_id: String,
    account_id: String,
    amount: f64,
    date: NaiveDate,
    #[serde(default)]
    authorized_date: Option<NaiveDate>,
    #[serde(default)]
    datetime: Option<DateTime<Utc>>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    merchant_name: Option<String>,
    #[serde(default)]
    pending: bool,
    #[serde(default)]
    pending_transaction_id: Option<String>,
    #[serde(default)]
    payment_channel: Option<String>,
    #[serde(default)]
    personal_finance_category: Option<WireCategory>,
    #[serde(default)]
    counterparties: Vec<WireCounterparty>,
}

#[derive(Debug, Deserialize)]
struct WireCategory {
    #[serde(default)]
    primary: Option<String>,
    #[serde(default)]
    detailed: Option<String>,
    #[serde(default)]
    confidence_level: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCounterparty {
    name: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    entity_id: Option<String>,
    #[serde(default)]
    logo_url: Option<String>,
    #[serde(default)]
    website: Option<String>,
    #[serde(default)]
    confidence_level: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireRemoved {
    transaction_id: String,
    #[serde(default)]
    account_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireAccount {
    account_id: String,
    name: String,
    #[serde(default)]
    official_name: Option<String>,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    balances: WireBalances,
}

#[derive(Debug, Default, Deserialize)]
struct WireBalances {
    #[serde(default)]
    current: Option<f64>,
    #[serde(default)]
    available: Option<f64>,
    #[serde(default)]
    limit: Option<f64>,
    #[serde(default)]
    iso_currency_code: Option<String>,
}

impl HttpConnector {
    pub fn new(config: HttpConnectorConfig) -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConnectorError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ConnectorError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| ConnectorError::InvalidResponse(format!("Failed to parse {}: {}", path, e)))
    }

    fn map_transport_error(&self, err: reqwest::Error) -> ConnectorError {
        if err.is_timeout() {
            ConnectorError::Timeout(self.config.timeout.as_secs())
        } else {
            ConnectorError::Transport(err.to_string())
        }
    }
}

/// Map a non-success response to a connector error
fn classify_error(status: StatusCode, body: &str) -> ConnectorError {
    let parsed: Option<WireErrorBody> = serde_json::from_str(body).ok();
    let code = parsed
        .as_ref()
        .and_then(|b| b.error_code.clone())
        .unwrap_or_default();
    let message = parsed
        .as_ref()
        .and_then(|b| b.error_message.clone())
        .unwrap_or_else(|| body.to_string());
    let is_item_error = parsed
        .as_ref()
        .and_then(|b| b.error_type.as_deref())
        .map(|t| t == "ITEM_ERROR")
        .unwrap_or(false);

    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        || code == "ITEM_LOGIN_REQUIRED"
        || code == "INVALID_ACCESS_TOKEN"
        || is_item_error
    {
        ConnectorError::Auth(format!("{} {}: {}", status, code, message))
    } else {
        ConnectorError::Transport(format!("{} {}: {}", status, code, message))
    }
}

/// Provider amounts are outflow-positive decimals
fn ledger_amount(provider_amount: f64) -> Result<Money, ConnectorError> {
    Money::from_decimal(-provider_amount).map_err(|e| ConnectorError::InvalidResponse(e.to_string()))
}

fn optional_money(value: Option<f64>) -> Result<Option<Money>, ConnectorError> {
    value
        .map(|v| Money::from_decimal(v).map_err(|e| ConnectorError::InvalidResponse(e.to_string())))
        .transpose()
}

impl WireTransaction {
    fn into_provider(self) -> Result<ProviderTransaction, ConnectorError> {
        let category = self
            .personal_finance_category
            .map(|c| ProviderCategory {
                primary: c.primary,
                detailed: c.detailed,
                confidence: c.confidence_level,
            })
            .unwrap_or_default();

        Ok(ProviderTransaction {
            amount: ledger_amount(self.amount)?,
            name: self
                .name
                .or(self.merchant_name)
                .unwrap_or_else(|| self.transaction_id.clone()),
            transaction_id: self.transaction_id,
            account_id: self.account_id,
            date: self.date,
            authorized_date: self.authorized_date,
            datetime: self.datetime,
            pending: self.pending,
            pending_transaction_id: self.pending_transaction_id,
            payment_channel: self.payment_channel,
            category,
            counterparties: self
                .counterparties
                .into_iter()
                .map(|c| Counterparty {
                    name: c.name,
                    entity_id: c.entity_id,
                    kind: c.kind,
                    logo_url: c.logo_url,
                    website: c.website,
                    confidence: c
                        .confidence_level
                        .as_deref()
                        .map(ConfidenceTier::parse)
                        .unwrap_or_default(),
                })
                .collect(),
        })
    }
}

impl WireAccount {
    fn into_provider(self) -> Result<ProviderAccount, ConnectorError> {
        Ok(ProviderAccount {
            account_id: self.account_id,
            name: self.name,
            official_name: self.official_name,
            kind: self.kind,
            subtype: self.subtype,
            balances: ProviderBalances {
                current: optional_money(self.balances.current)?,
                available: optional_money(self.balances.available)?,
                limit: optional_money(self.balances.limit)?,
                iso_currency_code: self.balances.iso_currency_code,
            },
        })
    }
}

impl WireSyncResponse {
    fn into_page(self) -> Result<SyncPage, ConnectorError> {
        Ok(SyncPage {
            added: self
                .added
                .into_iter()
                .map(WireTransaction::into_provider)
                .collect::<Result<_, _>>()?,
            modified: self
                .modified
                .into_iter()
                .map(WireTransaction::into_provider)
                .collect::<Result<_, _>>()?,
            removed: self
                .removed
                .into_iter()
                .map(|r| RemovedTransaction {
                    transaction_id: r.transaction_id,
                    account_id: r.account_id,
                })
                .collect(),
            accounts: self
                .accounts
                .into_iter()
                .map(WireAccount::into_provider)
                .collect::<Result<_, _>>()?,
            has_more: self.has_more,
            next_cursor: self.next_cursor.map(SyncCursor::new),
        })
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn fetch_deltas(
        &self,
        item: &ProviderItem,
        cursor: Option<&SyncCursor>,
    ) -> Result<SyncPage, ConnectorError> {
        let request = SyncRequest {
            client_id: &self.config.client_id,
            secret: &self.config.secret,
            access_token: &item.access_token,
            cursor: cursor.map(SyncCursor::as_str),
            count: SYNC_PAGE_SIZE,
        };

        let response: WireSyncResponse = self.post("/transactions/sync", &request).await?;
        let page = response.into_page()?;

        tracing::debug!(
            item_id = %item.item_id,
            added = page.added.len(),
            modified = page.modified.len(),
            removed = page.removed.len(),
            has_more = page.has_more,
            "Fetched sync page"
        );

        Ok(page)
    }

    async fn fetch_balances(
        &self,
        item: &ProviderItem,
    ) -> Result<Vec<ProviderAccount>, ConnectorError> {
        let request = BalanceRequest {
            client_id: &self.config.client_id,
            secret: &self.config.secret,
            access_token: &item.access_token,
        };

        let response: WireBalanceResponse = self.post("/accounts/balance/get", &request).await?;
        response
            .accounts
            .into_iter()
            .map(WireAccount::into_provider)
            .collect()
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
