//! Transaction table with indexes
//!
//! Indexed by external id (idempotency key), by account, and by
//! subcategory (direct assignment and splits).

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{AccountId, SubcategoryId, Transaction, TransactionId};

/// Serializable transaction data structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionData {
    transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "TransactionData", into = "TransactionData")]
pub struct TransactionTable {
    data: HashMap<TransactionId, Transaction>,
    /// Index: external id -> transaction id
    by_external: HashMap<String, TransactionId>,
    /// Index: account_id -> transaction_ids
    by_account: HashMap<AccountId, Vec<TransactionId>>,
    /// Index: subcategory_id -> transaction_ids
    by_subcategory: HashMap<SubcategoryId, Vec<TransactionId>>,
}

impl From<TransactionData> for TransactionTable {
    fn from(file_data: TransactionData) -> Self {
        let mut table = Self::default();
        for txn in file_data.transactions {
            table.upsert(txn);
        }
        table
    }
}

impl From<TransactionTable> for TransactionData {
    fn from(table: TransactionTable) -> Self {
        let mut transactions: Vec<_> = table.data.into_values().collect();
        transactions.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then(b.created_at.cmp(&a.created_at))
                .then(a.external_id.cmp(&b.external_id))
        });
        Self { transactions }
    }
}

fn subcategory_keys(txn: &Transaction) -> Vec<SubcategoryId> {
    let mut keys: Vec<SubcategoryId> = txn.splits.iter().map(|s| s.subcategory_id).collect();
    keys.extend(txn.subcategory_id);
    keys.sort();
    keys.dedup();
    keys
}

impl TransactionTable {
    /// Get a transaction by ID
    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.data.get(&id)
    }

    /// Get a transaction by its provider id
    pub fn get_by_external(&self, external_id: &str) -> Option<&Transaction> {
        self.by_external
            .get(external_id)
            .and_then(|id| self.data.get(id))
    }

    pub fn contains_external(&self, external_id: &str) -> bool {
        self.by_external.contains_key(external_id)
    }

    /// Iterate over all transactions (unordered)
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.data.values()
    }

    /// All transactions, newest first
    pub fn get_all(&self) -> Vec<&Transaction> {
        let mut transactions: Vec<_> = self.data.values().collect();
        transactions.sort_by(|a, b| b.date.cmp(&a.date).then(a.external_id.cmp(&b.external_id)));
        transactions
    }

    /// Get transactions for an account, newest first
    pub fn get_by_account(&self, account_id: AccountId) -> Vec<&Transaction> {
        let ids = self
            .by_account
            .get(&account_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        let mut transactions: Vec<_> = ids.iter().filter_map(|id| self.data.get(id)).collect();
        transactions.sort_by(|a, b| b.date.cmp(&a.date));
        transactions
    }

    /// Transactions assigned to a subcategory directly or through a split
    pub fn get_by_subcategory(&self, subcategory_id: SubcategoryId) -> Vec<&Transaction> {
        let ids = self
            .by_subcategory
            .get(&subcategory_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        ids.iter().filter_map(|id| self.data.get(id)).collect()
    }

    /// Get transactions posted in an inclusive date range
    pub fn get_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<&Transaction> {
        self.get_all()
            .into_iter()
            .filter(|t| t.date >= start && t.date <= end)
            .collect()
    }

    /// Insert or update a transaction, keeping indexes in sync
    pub fn upsert(&mut self, txn: Transaction) {
        self.unindex(txn.id);

        self.by_external.insert(txn.external_id.clone(), txn.id);
        self.by_account.entry(txn.account_id).or_default().push(txn.id);
        for sub in subcategory_keys(&txn) {
            self.by_subcategory.entry(sub).or_default().push(txn.id);
        }

        self.data.insert(txn.id, txn);
    }

    /// Delete a transaction (its splits go with it)
    pub fn remove(&mut self, id: TransactionId) -> Option<Transaction> {
        self.unindex(id);
        self.data.remove(&id)
    }

    /// Delete a transaction by its provider id
    pub fn remove_by_external(&mut self, external_id: &str) -> Option<Transaction> {
        let id = *self.by_external.get(external_id)?;
        self.remove(id)
    }

    fn unindex(&mut self, id: TransactionId) {
        let Some(old) = self.data.get(&id) else {
            return;
        };

        self.by_external.remove(&old.external_id);
        if let Some(ids) = self.by_account.get_mut(&old.account_id) {
            ids.retain(|&t| t != id);
        }
        for sub in subcategory_keys(old) {
            if let Some(ids) = self.by_subcategory.get_mut(&sub) {
                ids.retain(|&t| t != id);
            }
        }
    }

    /// Count transactions
    pub fn count(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, TransactionSplit};

    fn txn(external_id: &str, account_id: AccountId, day: u32, cents: i64) -> Transaction {
        Transaction::new(
            external_id,
            account_id,
            NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            Money::from_cents(cents),
            "Test",
        )
    }

    #[test]
    fn test_upsert_and_external_lookup() {
        let mut table = TransactionTable::default();
        let account = AccountId::new();
        let t = txn("ext-1", account, 15, -5000);
        let id = t.id;
        table.upsert(t);

        assert_eq!(table.get_by_external("ext-1").unwrap().id, id);
        assert_eq!(table.get_by_account(account).len(), 1);
        assert!(table.contains_external("ext-1"));
        assert_eq!(table.count(), 1);
    }

    #[test]
    fn test_subcategory_index_follows_updates() {
        let mut table = TransactionTable::default();
        let sub_a = SubcategoryId::new();
        let sub_b = SubcategoryId::new();
        let mut t = txn("ext-1", AccountId::new(), 15, -5000);
        t.subcategory_id = Some(sub_a);
        table.upsert(t.clone());
        assert_eq!(table.get_by_subcategory(sub_a).len(), 1);

        t.replace_splits(vec![
            TransactionSplit::new(sub_b, Money::from_cents(-3000)),
            TransactionSplit::new(sub_b, Money::from_cents(-2000)),
        ]);
        table.upsert(t);

        assert!(table.get_by_subcategory(sub_a).is_empty());
        assert_eq!(table.get_by_subcategory(sub_b).len(), 1);
    }

    #[test]
    fn test_remove_by_external_clears_indexes() {
        let mut table = TransactionTable::default();
        let account = AccountId::new();
        table.upsert(txn("ext-1", account, 15, -5000));

        assert!(table.remove_by_external("ext-1").is_some());
        assert!(table.remove_by_external("ext-1").is_none());
        assert!(table.get_by_account(account).is_empty());
        assert!(!table.contains_external("ext-1"));
    }

    #[test]
    fn test_date_range() {
        let mut table = TransactionTable::default();
        let account = AccountId::new();
        table.upsert(txn("a", account, 10, -100));
        table.upsert(txn("b", account, 15, -200));
        table.upsert(txn("c", account, 20, -300));

        let start = NaiveDate::from_ymd_opt(2025, 1, 12).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        assert_eq!(table.get_by_date_range(start, end).len(), 2);
    }

    #[test]
    fn test_serialization_rebuilds_indexes() {
        let mut table = TransactionTable::default();
        let account = AccountId::new();
        table.upsert(txn("ext-1", account, 15, -5000));

        let json = serde_json::to_string(&table).unwrap();
        let loaded: TransactionTable = serde_json::from_str(&json).unwrap();
        assert!(loaded.contains_external("ext-1"));
        assert_eq!(loaded.get_by_account(account).len(), 1);
    }
}
