//! Scripted connector
//!
//! Serves pre-recorded pages keyed by `(item id, cursor)`. Used by tests and
//! by the CLI when `provider.fixture_file` is configured. Failures can be
//! queued to exercise the reconciler's rollback path.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use super::{Connector, ConnectorError, ProviderAccount, SyncPage};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{ProviderItem, SyncCursor};

type PageKey = (String, Option<String>);

/// On-disk fixture format
#[derive(Debug, Default, Deserialize)]
pub struct ScriptFixture {
    #[serde(default)]
    pub items: HashMap<String, ScriptedItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScriptedItem {
    #[serde(default)]
    pub pages: Vec<ScriptedPage>,
    #[serde(default)]
    pub balances: Vec<ProviderAccount>,
}

#[derive(Debug, Deserialize)]
pub struct ScriptedPage {
    /// Cursor the page is served for; `None` for the first sync
    #[serde(default)]
    pub cursor: Option<String>,
    pub page: SyncPage,
}

/// In-memory connector serving scripted pages
#[derive(Default)]
pub struct ScriptedConnector {
    pages: DashMap<PageKey, SyncPage>,
    balances: DashMap<String, Vec<ProviderAccount>>,
    failures: Mutex<VecDeque<ConnectorError>>,
    calls: DashMap<PageKey, usize>,
    delay: Option<Duration>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep before answering each request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Load a fixture file
    pub fn from_file(path: &Path) -> LedgerResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!(
                "Failed to read provider fixture {}: {}",
                path.display(),
                e
            ))
        })?;
        let fixture: ScriptFixture = serde_json::from_str(&contents)?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn from_fixture(fixture: ScriptFixture) -> Self {
        let connector = Self::new();
        for (item_id, item) in fixture.items {
            for scripted in item.pages {
                connector.push_page(&item_id, scripted.cursor.as_deref(), scripted.page);
            }
            if !item.balances.is_empty() {
                connector.set_balances(&item_id, item.balances);
            }
        }
        connector
    }

    /// Serve `page` when `item_id` is synced from `cursor`
    pub fn push_page(&self, item_id: &str, cursor: Option<&str>, page: SyncPage) {
        self.pages
            .insert((item_id.to_string(), cursor.map(str::to_string)), page);
    }

    pub fn set_balances(&self, item_id: &str, accounts: Vec<ProviderAccount>) {
        self.balances.insert(item_id.to_string(), accounts);
    }

    /// Fail the next request with `error`
    pub fn fail_next(&self, error: ConnectorError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(error);
    }

    /// How many times the page after `cursor` was requested for `item_id`
    pub fn fetch_count(&self, item_id: &str, cursor: Option<&str>) -> usize {
        self.calls
            .get(&(item_id.to_string(), cursor.map(str::to_string)))
            .map(|count| *count.value())
            .unwrap_or(0)
    }

    fn take_failure(&self) -> Option<ConnectorError> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn fetch_deltas(
        &self,
        item: &ProviderItem,
        cursor: Option<&SyncCursor>,
    ) -> Result<SyncPage, ConnectorError> {
        let key = (
            item.item_id.clone(),
            cursor.map(|c| c.as_str().to_string()),
        );
        *self.calls.entry(key.clone()).or_insert(0) += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.take_failure() {
            return Err(error);
        }

        // Nothing scripted means nothing changed since `cursor`
        Ok(self
            .pages
            .get(&key)
            .map(|page| page.value().clone())
            .unwrap_or_else(|| SyncPage {
                next_cursor: cursor.cloned(),
                ..SyncPage::default()
            }))
    }

    async fn fetch_balances(
        &self,
        item: &ProviderItem,
    ) -> Result<Vec<ProviderAccount>, ConnectorError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }

        Ok(self
            .balances
            .get(&item.item_id)
            .map(|accounts| accounts.value().clone())
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
