//! Account table
//!
//! Indexed by provider account id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{Account, AccountId};

/// Serializable account data structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountData {
    accounts: Vec<Account>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "AccountData", into = "AccountData")]
pub struct AccountTable {
    data: HashMap<AccountId, Account>,
    /// Index: provider account id -> account id
    by_external: HashMap<String, AccountId>,
}

impl From<AccountData> for AccountTable {
    fn from(file_data: AccountData) -> Self {
        let mut table = Self::default();
        for account in file_data.accounts {
            table.upsert(account);
        }
        table
    }
}

impl From<AccountTable> for AccountData {
    fn from(table: AccountTable) -> Self {
        let mut accounts: Vec<_> = table.data.into_values().collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name).then(a.external_id.cmp(&b.external_id)));
        Self { accounts }
    }
}

impl AccountTable {
    /// Get an account by ID
    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.data.get(&id)
    }

    /// Get an account by its provider id
    pub fn get_by_external(&self, external_id: &str) -> Option<&Account> {
        self.by_external
            .get(external_id)
            .and_then(|id| self.data.get(id))
    }

    /// All accounts sorted by name
    pub fn get_all(&self) -> Vec<&Account> {
        let mut accounts: Vec<_> = self.data.values().collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        accounts
    }

    /// Accounts linked through a provider item
    pub fn get_by_item(&self, item_id: &str) -> Vec<&Account> {
        let mut accounts: Vec<_> = self.data.values().filter(|a| a.item_id == item_id).collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        accounts
    }

    /// Insert or update an account
    pub fn upsert(&mut self, account: Account) {
        if let Some(old) = self.data.get(&account.id) {
            self.by_external.remove(&old.external_id);
        }
        self.by_external.insert(account.external_id.clone(), account.id);
        self.data.insert(account.id, account);
    }

    /// Count accounts
    pub fn count(&self) -> usize {
        self.data.len()
    }
}
