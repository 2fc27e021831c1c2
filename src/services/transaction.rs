//! Transaction service
//!
//! Lookup and listing of synchronized transactions, split management,
//! manual categorization and intake of classifier predictions. Every edit
//! that changes where money is charged recomputes the budgets after the
//! transaction's month in the same unit of work.

use chrono::NaiveDate;

use crate::config::settings::ClassifierSettings;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    AccountId, BudgetPeriod, Money, SubcategoryId, Transaction, TransactionId, TransactionSplit,
};
use crate::services::budget::propagate_forward;
use crate::storage::{LedgerState, Storage};

/// Service for transaction management
pub struct TransactionService<'a> {
    storage: &'a Storage,
    auto_assign_threshold: f64,
}

/// Options for filtering transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Filter by account
    pub account_id: Option<AccountId>,
    /// Filter by subcategory (direct or split)
    pub subcategory_id: Option<SubcategoryId>,
    /// Filter by date range start
    pub start_date: Option<NaiveDate>,
    /// Filter by date range end
    pub end_date: Option<NaiveDate>,
    /// Only transactions with neither a subcategory nor splits
    pub uncategorized: bool,
    /// Maximum number of transactions to return
    pub limit: Option<usize>,
}

impl TransactionFilter {
    /// Create a new empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by account
    pub fn account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn subcategory(mut self, subcategory_id: SubcategoryId) -> Self {
        self.subcategory_id = Some(subcategory_id);
        self
    }

    /// Filter by date range
    pub fn date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn uncategorized(mut self) -> Self {
        self.uncategorized = true;
        self
    }

    /// Limit results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One requested split line
#[derive(Debug, Clone)]
pub struct SplitRequest {
    pub subcategory_id: SubcategoryId,
    pub amount: Money,
    pub memo: Option<String>,
}

impl SplitRequest {
    pub fn new(subcategory_id: SubcategoryId, amount: Money) -> Self {
        Self {
            subcategory_id,
            amount,
            memo: None,
        }
    }
}

fn require_subcategory(state: &LedgerState, id: SubcategoryId) -> LedgerResult<()> {
    if state.categories.get_subcategory(id).is_none() {
        return Err(LedgerError::subcategory_not_found(id.to_string()));
    }
    Ok(())
}

/// Persist an edited transaction and push its month's new activity forward
fn save_edit(state: &mut LedgerState, txn: Transaction) -> LedgerResult<Transaction> {
    txn.validate()
        .map_err(|e| LedgerError::Validation(e.to_string()))?;
    let period = BudgetPeriod::containing(txn.date);
    state.transactions.upsert(txn.clone());
    propagate_forward(state, period);
    Ok(txn)
}

impl<'a> TransactionService<'a> {
    /// Create a new transaction service
    pub fn new(storage: &'a Storage) -> Self {
        Self::with_classifier(storage, &ClassifierSettings::default())
    }

    pub fn with_classifier(storage: &'a Storage, classifier: &ClassifierSettings) -> Self {
        Self {
            storage,
            auto_assign_threshold: classifier.auto_assign_threshold,
        }
    }

    /// Get a transaction by ID
    pub fn get(&self, id: TransactionId) -> LedgerResult<Option<Transaction>> {
        self.storage.read(|state| state.transactions.get(id).cloned())
    }

    /// Find a transaction by provider id or ID string
    pub fn find(&self, identifier: &str) -> LedgerResult<Option<Transaction>> {
        self.storage.read(|state| {
            if let Some(txn) = state.transactions.get_by_external(identifier) {
                return Some(txn.clone());
            }
            identifier
                .parse::<TransactionId>()
                .ok()
                .and_then(|id| state.transactions.get(id))
                .cloned()
        })
    }

    /// List transactions, newest first
    pub fn list(&self, filter: TransactionFilter) -> LedgerResult<Vec<Transaction>> {
        self.storage.read(|state| {
            let mut transactions: Vec<&Transaction> = if let Some(account_id) = filter.account_id {
                state.transactions.get_by_account(account_id)
            } else if let Some(sub) = filter.subcategory_id {
                let mut list = state.transactions.get_by_subcategory(sub);
                list.sort_by(|a, b| b.date.cmp(&a.date).then(a.external_id.cmp(&b.external_id)));
                list
            } else {
                state.transactions.get_all()
            };

            if let Some(sub) = filter.subcategory_id {
                transactions.retain(|t| {
                    t.subcategory_id == Some(sub)
                        || t.splits.iter().any(|s| s.subcategory_id == sub)
                });
            }
            if let Some(start) = filter.start_date {
                transactions.retain(|t| t.date >= start);
            }
            if let Some(end) = filter.end_date {
                transactions.retain(|t| t.date <= end);
            }
            if filter.uncategorized {
                transactions.retain(|t| t.subcategory_id.is_none() && !t.is_split);
            }
            if let Some(limit) = filter.limit {
                transactions.truncate(limit);
            }

            transactions.into_iter().cloned().collect()
        })
    }

    /// Replace a transaction's splits
    ///
    /// The split amounts must sum exactly to the transaction amount. An empty
    /// list removes all splits and leaves the transaction uncategorized.
    pub fn split(&self, id: TransactionId, requests: Vec<SplitRequest>) -> LedgerResult<Transaction> {
        self.storage.transact(|state| {
            let mut txn = state
                .transactions
                .get(id)
                .cloned()
                .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))?;

            for request in &requests {
                require_subcategory(state, request.subcategory_id)?;
            }

            let total: Money = requests.iter().map(|r| r.amount).sum();
            if !requests.is_empty() && total != txn.amount {
                return Err(LedgerError::Validation(format!(
                    "Split totals ({}) do not match transaction amount ({})",
                    total, txn.amount
                )));
            }

            let splits = requests
                .into_iter()
                .map(|r| TransactionSplit::with_memo(r.subcategory_id, r.amount, r.memo))
                .collect::<Vec<_>>();
            let count = splits.len();
            txn.replace_splits(splits);

            tracing::info!(
                transaction = %txn.external_id,
                splits = count,
                "Replaced splits"
            );
            save_edit(state, txn)
        })
    }

    /// Remove all splits from a transaction
    pub fn clear_splits(&self, id: TransactionId) -> LedgerResult<Transaction> {
        self.split(id, Vec::new())
    }

    /// Assign a transaction to a single subcategory (or none), dropping any
    /// splits
    pub fn categorize(
        &self,
        id: TransactionId,
        subcategory_id: Option<SubcategoryId>,
    ) -> LedgerResult<Transaction> {
        self.storage.transact(|state| {
            let mut txn = state
                .transactions
                .get(id)
                .cloned()
                .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))?;

            if let Some(sub) = subcategory_id {
                require_subcategory(state, sub)?;
            }

            txn.set_subcategory(subcategory_id);
            save_edit(state, txn)
        })
    }

    /// Record a classifier guess
    ///
    /// The prediction is always stored. It is also applied as the direct
    /// assignment when confidence reaches the auto-assign threshold and the
    /// transaction is neither categorized nor split.
    pub fn apply_prediction(
        &self,
        id: TransactionId,
        subcategory_id: SubcategoryId,
        confidence: f64,
    ) -> LedgerResult<Transaction> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(LedgerError::Validation(format!(
                "Prediction confidence {} is outside 0.0..=1.0",
                confidence
            )));
        }

        let threshold = self.auto_assign_threshold;
        self.storage.transact(|state| {
            let mut txn = state
                .transactions
                .get(id)
                .cloned()
                .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))?;
            require_subcategory(state, subcategory_id)?;

            txn.predicted_subcategory_id = Some(subcategory_id);
            txn.predicted_confidence = Some(confidence);

            let auto_assign =
                confidence >= threshold && txn.subcategory_id.is_none() && !txn.is_split;
            if auto_assign {
                txn.set_subcategory(Some(subcategory_id));
            }

            tracing::debug!(
                transaction = %txn.external_id,
                confidence,
                auto_assign,
                "Applied prediction"
            );
            save_edit(state, txn)
        })
    }

    pub fn count(&self) -> LedgerResult<usize> {
        self.storage.read(|state| state.transactions.count())
    }
}
