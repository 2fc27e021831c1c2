//! Ledger reconciler
//!
//! Drives one incremental sync of a provider item:
//!
//! ```text
//! Idle -> Paging -> Applying -> Committed
//!            \          \
//!             +----------+--> Failed
//! ```
//!
//! Paging pulls every page after the stored cursor and refreshes account
//! balances as pages arrive. Applying merges the accumulated added, modified
//! and removed records into the ledger. The new cursor is written in the
//! same unit of work as the records it covers, so a failed sync leaves the
//! cursor where it was and the next attempt re-fetches the same pages.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::OwnedMutexGuard;

use crate::config::Settings;
use crate::connector::{
    Connector, ConnectorError, ProviderAccount, ProviderTransaction, RemovedTransaction,
};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Account, AccountType, BalanceSnapshot, BudgetPeriod, Institution, ProviderItem, SyncCursor,
    Transaction, ACCOUNT_TRANSFER_SUBCATEGORY, TRANSFERS_CATEGORY,
};
use crate::services::budget::propagate_forward;
use crate::services::merchant::link_counterparties;
use crate::services::transfer::TransferMatcher;
use crate::storage::{FileLock, LedgerState, Storage};
use crate::sync::ItemLocks;

/// Phase of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Paging,
    Applying,
    Committed,
    Failed,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Paging => "paging",
            Self::Applying => "applying",
            Self::Committed => "committed",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of a committed sync. Counts are records received from the
/// provider, including ones that turned out to be no-ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    pub item_id: String,
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
    pub pages: usize,
    pub cursor: Option<SyncCursor>,
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} added, {} modified, {} removed ({} page(s))",
            self.item_id, self.added, self.modified, self.removed, self.pages
        )
    }
}

/// Deltas accumulated across every page of one sync
#[derive(Debug, Default)]
struct Deltas {
    added: Vec<ProviderTransaction>,
    modified: Vec<ProviderTransaction>,
    removed: Vec<RemovedTransaction>,
    pages: usize,
    cursor: Option<SyncCursor>,
}

/// Track the earliest month whose activity changed
fn touch(earliest: &mut Option<BudgetPeriod>, date: chrono::NaiveDate) {
    let period = BudgetPeriod::containing(date);
    if earliest.map_or(true, |current| period < current) {
        *earliest = Some(period);
    }
}

/// Create or refresh local accounts from provider account records
pub fn apply_accounts(
    state: &mut LedgerState,
    item: &ProviderItem,
    accounts: &[ProviderAccount],
    default_currency: &str,
) {
    let now = Utc::now();
    for reported in accounts {
        let mut account = match state.accounts.get_by_external(&reported.account_id) {
            Some(existing) => existing.clone(),
            None => {
                let currency = reported
                    .balances
                    .iso_currency_code
                    .clone()
                    .unwrap_or_else(|| default_currency.to_string());
                let mut account = Account::new(
                    reported.account_id.clone(),
                    item.item_id.clone(),
                    reported.name.clone(),
                    AccountType::from_provider(&reported.kind, reported.subtype.as_deref()),
                    currency,
                );
                account.institution = Institution {
                    id: item.institution_id.clone(),
                    name: item.institution_name.clone(),
                };
                tracing::info!(
                    item_id = %item.item_id,
                    account = %reported.account_id,
                    "Created account"
                );
                account
            }
        };

        account.name.clone_from(&reported.name);
        account.official_name.clone_from(&reported.official_name);
        account.set_balance(BalanceSnapshot {
            current: reported.balances.current.unwrap_or_default(),
            available: reported.balances.available,
            limit: reported.balances.limit,
            as_of: Some(now),
        });
        state.accounts.upsert(account);
    }
}

fn copy_provider_fields(txn: &mut Transaction, record: &ProviderTransaction) {
    txn.amount = record.amount;
    txn.date = record.date;
    txn.authorized_date = record.authorized_date;
    txn.transacted_at = record.datetime;
    txn.name.clone_from(&record.name);
    txn.pending = record.pending;
    txn.pending_transaction_id.clone_from(&record.pending_transaction_id);
    txn.payment_channel.clone_from(&record.payment_channel);
    txn.provider_category = record.category.clone();
    txn.updated_at = Utc::now();
}

/// Merges accumulated deltas into a ledger state
struct Applier<'s> {
    state: &'s mut LedgerState,
    matcher: TransferMatcher,
    earliest: Option<BudgetPeriod>,
}

impl<'s> Applier<'s> {
    fn add(&mut self, record: &ProviderTransaction) -> LedgerResult<()> {
        if self.state.transactions.contains_external(&record.transaction_id) {
            tracing::debug!(transaction = %record.transaction_id, "Skipping known transaction");
            return Ok(());
        }

        let account_id = self
            .state
            .accounts
            .get_by_external(&record.account_id)
            .map(|a| a.id)
            .ok_or_else(|| {
                LedgerError::Reconciliation(format!(
                    "Transaction {} references unknown account {}",
                    record.transaction_id, record.account_id
                ))
            })?;

        let mut txn = Transaction::new(
            record.transaction_id.clone(),
            account_id,
            record.date,
            record.amount,
            record.name.clone(),
        );
        copy_provider_fields(&mut txn, record);
        txn.is_transfer = record.category.is_transfer();

        if txn.is_transfer {
            self.matcher.link(&self.state.transactions, &mut txn);
            if let Some(sub) = self
                .state
                .categories
                .find_subcategory(TRANSFERS_CATEGORY, ACCOUNT_TRANSFER_SUBCATEGORY)
            {
                txn.subcategory_id = Some(sub.id);
            }
        } else {
            link_counterparties(&mut self.state.merchants, &mut txn, &record.counterparties);
        }

        touch(&mut self.earliest, txn.date);
        self.state.transactions.upsert(txn);
        Ok(())
    }

    fn modify(&mut self, record: &ProviderTransaction) -> LedgerResult<()> {
        let Some(existing) = self
            .state
            .transactions
            .get_by_external(&record.transaction_id)
        else {
            tracing::debug!(transaction = %record.transaction_id, "Modified record not found, adding");
            return self.add(record);
        };

        let mut txn = existing.clone();
        touch(&mut self.earliest, txn.date);

        let amount_changed = txn.amount != record.amount;
        copy_provider_fields(&mut txn, record);

        if txn.is_split && amount_changed {
            tracing::warn!(
                transaction = %txn.external_id,
                "Amount changed under existing splits, clearing them"
            );
            txn.replace_splits(Vec::new());
        }

        touch(&mut self.earliest, txn.date);
        self.state.transactions.upsert(txn);
        Ok(())
    }

    fn remove(&mut self, record: &RemovedTransaction) {
        if let Some(txn) = self
            .state
            .transactions
            .remove_by_external(&record.transaction_id)
        {
            touch(&mut self.earliest, txn.date);
        }
    }
}

/// Runs syncs for provider items
pub struct LedgerReconciler {
    storage: Arc<Storage>,
    connector: Arc<dyn Connector>,
    locks: Arc<ItemLocks>,
    matcher: TransferMatcher,
    request_timeout: Duration,
    default_currency: String,
}

impl LedgerReconciler {
    pub fn new(storage: Arc<Storage>, connector: Arc<dyn Connector>, settings: &Settings) -> Self {
        Self {
            storage,
            connector,
            locks: Arc::new(ItemLocks::new()),
            matcher: TransferMatcher::from_settings(&settings.transfers),
            request_timeout: settings.sync.request_timeout(),
            default_currency: settings.currency_code.clone(),
        }
    }

    fn transition(&self, item_id: &str, state: &mut SyncState, next: SyncState) {
        tracing::debug!(item_id = %item_id, from = %state, to = %next, "Sync state");
        *state = next;
    }

    /// Take exclusive ownership of `item_id` across tasks and processes,
    /// then reload the ledger so the stored cursor is current
    async fn lease(&self, item_id: &str) -> LedgerResult<(OwnedMutexGuard<()>, FileLock)> {
        let guard = self.locks.lock(item_id).await;

        let storage = Arc::clone(&self.storage);
        let id = item_id.to_string();
        let file_lock = tokio::task::spawn_blocking(move || storage.lock_item(&id))
            .await
            .map_err(|e| LedgerError::Storage(format!("Item lock task failed: {}", e)))??;

        self.storage.load()?;
        Ok((guard, file_lock))
    }

    fn load_item(&self, item_id: &str) -> LedgerResult<ProviderItem> {
        self.storage
            .read(|state| state.items.get(item_id).cloned())?
            .ok_or_else(|| LedgerError::item_not_found(item_id))
    }

    async fn with_timeout<T>(
        &self,
        request: impl std::future::Future<Output = Result<T, ConnectorError>>,
    ) -> LedgerResult<T> {
        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ConnectorError::Timeout(self.request_timeout.as_secs()).into()),
        }
    }

    /// Run one full sync of `item_id`
    pub async fn sync_item(&self, item_id: &str) -> LedgerResult<SyncSummary> {
        let _lease = self.lease(item_id).await?;
        let item = self.load_item(item_id)?;

        let mut state = SyncState::Idle;
        tracing::info!(
            item_id = %item_id,
            connector = self.connector.name(),
            cursor = ?item.cursor.as_ref().map(SyncCursor::as_str),
            "Starting sync"
        );

        match self.run(&item, &mut state).await {
            Ok(summary) => {
                self.transition(item_id, &mut state, SyncState::Committed);
                tracing::info!(
                    item_id = %item_id,
                    added = summary.added,
                    modified = summary.modified,
                    removed = summary.removed,
                    pages = summary.pages,
                    "Sync committed"
                );
                Ok(summary)
            }
            Err(e) => {
                let phase = state;
                self.transition(item_id, &mut state, SyncState::Failed);
                tracing::warn!(
                    item_id = %item_id,
                    phase = %phase,
                    retryable = e.is_retryable(),
                    error = %e,
                    "Sync failed"
                );
                Err(e)
            }
        }
    }

    async fn run(&self, item: &ProviderItem, state: &mut SyncState) -> LedgerResult<SyncSummary> {
        self.transition(&item.item_id, state, SyncState::Paging);
        let deltas = self.fetch_all(item).await?;

        self.transition(&item.item_id, state, SyncState::Applying);
        let summary = SyncSummary {
            item_id: item.item_id.clone(),
            added: deltas.added.len(),
            modified: deltas.modified.len(),
            removed: deltas.removed.len(),
            pages: deltas.pages,
            cursor: deltas.cursor.clone(),
        };
        self.apply(item, deltas)?;
        Ok(summary)
    }

    async fn fetch_all(&self, item: &ProviderItem) -> LedgerResult<Deltas> {
        let mut deltas = Deltas {
            cursor: item.cursor.clone(),
            ..Deltas::default()
        };

        loop {
            let page = self
                .with_timeout(self.connector.fetch_deltas(item, deltas.cursor.as_ref()))
                .await?;
            deltas.pages += 1;

            if page.has_more && page.next_cursor.is_none() {
                return Err(ConnectorError::InvalidResponse(
                    "has_more set without a next cursor".into(),
                )
                .into());
            }

            tracing::debug!(
                item_id = %item.item_id,
                page = deltas.pages,
                added = page.added.len(),
                modified = page.modified.len(),
                removed = page.removed.len(),
                has_more = page.has_more,
                "Fetched page"
            );

            if !page.accounts.is_empty() {
                let currency = self.default_currency.as_str();
                self.storage.transact(|state| {
                    apply_accounts(state, item, &page.accounts, currency);
                    Ok(())
                })?;
            }

            deltas.added.extend(page.added);
            deltas.modified.extend(page.modified);
            deltas.removed.extend(page.removed);
            if page.next_cursor.is_some() {
                deltas.cursor = page.next_cursor;
            }

            if !page.has_more {
                return Ok(deltas);
            }
        }
    }

    fn apply(&self, item: &ProviderItem, deltas: Deltas) -> LedgerResult<()> {
        let matcher = self.matcher;
        self.storage.transact(|state| {
            let mut applier = Applier {
                state: &mut *state,
                matcher,
                earliest: None,
            };

            for record in &deltas.added {
                applier.add(record)?;
            }
            for record in &deltas.modified {
                applier.modify(record)?;
            }
            for record in &deltas.removed {
                applier.remove(record);
            }

            let earliest = applier.earliest;
            let stored = state
                .items
                .get_mut(&item.item_id)
                .ok_or_else(|| LedgerError::item_not_found(item.item_id.as_str()))?;
            stored.mark_synced(deltas.cursor.clone(), Utc::now());

            if let Some(period) = earliest {
                propagate_forward(state, period);
            }
            Ok(())
        })
    }

    /// Fetch current balances outside of a delta sync
    pub async fn refresh_balances(&self, item_id: &str) -> LedgerResult<Vec<Account>> {
        let _lease = self.lease(item_id).await?;
        let item = self.load_item(item_id)?;

        let accounts = self
            .with_timeout(self.connector.fetch_balances(&item))
            .await?;
        let currency = self.default_currency.as_str();

        self.storage.transact(|state| {
            apply_accounts(state, &item, &accounts, currency);
            Ok(state
                .accounts
                .get_by_item(item_id)
                .into_iter()
                .cloned()
                .collect())
        })
    }
}
