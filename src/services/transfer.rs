//! Transfer matching
//!
//! Transfers between two of the user's accounts arrive as two independent
//! records. When one side is ingested, the matcher looks for the other side
//! already in the ledger and links the new record to it. The counterpart is
//! left as is, so a pair is usually linked from one side only. Lookups here
//! follow the reference in both directions.

use std::collections::HashSet;

use chrono::Duration;

use crate::config::settings::TransferSettings;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Transaction, TransactionId};
use crate::storage::{Storage, TransactionTable};

/// Searches the ledger for the other side of a transfer
#[derive(Debug, Clone, Copy)]
pub struct TransferMatcher {
    window_days: i64,
    tolerance_cents: i64,
}

impl Default for TransferMatcher {
    fn default() -> Self {
        Self::from_settings(&TransferSettings::default())
    }
}

impl TransferMatcher {
    pub fn new(window_days: i64, tolerance_cents: i64) -> Self {
        Self {
            window_days,
            tolerance_cents,
        }
    }

    pub fn from_settings(settings: &TransferSettings) -> Self {
        Self::new(settings.match_window_days, settings.tolerance_cents)
    }

    /// Find the counterpart for `candidate`
    ///
    /// Eligible transactions sit on another account, are flagged as
    /// transfers, were posted within the window, and carry the opposite
    /// amount within tolerance. The closest date wins; ties go to the
    /// earlier posting, then to the lower external id.
    pub fn find_counterpart<'t>(
        &self,
        transactions: &'t TransactionTable,
        candidate: &Transaction,
    ) -> Option<&'t Transaction> {
        let window = Duration::days(self.window_days);
        let start = candidate.date - window;
        let end = candidate.date + window;
        let wanted = -candidate.amount;

        transactions
            .get_by_date_range(start, end)
            .into_iter()
            .filter(|t| t.account_id != candidate.account_id)
            .filter(|t| t.is_transfer)
            .filter(|t| t.external_id != candidate.external_id)
            .filter(|t| t.amount.is_within(wanted, self.tolerance_cents))
            .min_by(|a, b| {
                let dist_a = (a.date - candidate.date).num_days().abs();
                let dist_b = (b.date - candidate.date).num_days().abs();
                dist_a
                    .cmp(&dist_b)
                    .then(a.date.cmp(&b.date))
                    .then(a.external_id.cmp(&b.external_id))
            })
    }

    /// Link `candidate` to its counterpart if one exists. Returns whether a
    /// match was found.
    pub fn link(&self, transactions: &TransactionTable, candidate: &mut Transaction) -> bool {
        match self.find_counterpart(transactions, candidate) {
            Some(counterpart) => {
                tracing::debug!(
                    transaction = %candidate.external_id,
                    counterpart = %counterpart.external_id,
                    "Matched transfer"
                );
                candidate.transfer_account_id = Some(counterpart.account_id);
                candidate.transfer_transaction_id = Some(counterpart.external_id.clone());
                true
            }
            None => false,
        }
    }
}

/// Queries over matched and unmatched transfers
pub struct TransferService<'a> {
    storage: &'a Storage,
}

impl<'a> TransferService<'a> {
    /// Create a new transfer service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Get the linked transaction for a transfer
    pub fn get_linked_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> LedgerResult<Option<Transaction>> {
        self.storage.read(|state| {
            let txn = state
                .transactions
                .get(transaction_id)
                .ok_or_else(|| LedgerError::transaction_not_found(transaction_id.to_string()))?;

            Ok(linked_counterpart(&state.transactions, txn).cloned())
        })?
    }

    /// Transfers with no counterpart linked yet, newest first
    pub fn unmatched(&self) -> LedgerResult<Vec<Transaction>> {
        self.storage.read(|state| {
            let referenced: HashSet<&str> = state
                .transactions
                .iter()
                .filter_map(|t| t.transfer_transaction_id.as_deref())
                .collect();

            state
                .transactions
                .get_all()
                .into_iter()
                .filter(|t| t.is_transfer && t.transfer_transaction_id.is_none())
                .filter(|t| !referenced.contains(t.external_id.as_str()))
                .cloned()
                .collect()
        })
    }
}

/// The other side of a transfer: the record `txn` points at, or else a
/// record pointing at `txn`
pub fn linked_counterpart<'t>(
    transactions: &'t TransactionTable,
    txn: &Transaction,
) -> Option<&'t Transaction> {
    match txn.transfer_transaction_id.as_deref() {
        Some(ext) => transactions.get_by_external(ext),
        None => transactions
            .iter()
            .find(|t| t.transfer_transaction_id.as_deref() == Some(txn.external_id.as_str())),
    }
}
