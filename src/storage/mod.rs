//! Storage layer for envelope-ledger
//!
//! The whole ledger is one JSON document (`data/ledger.json`) loaded into
//! indexed in-memory tables. Reads see a consistent snapshot. Writes go
//! through [`Storage::transact`], which takes the ledger file lock, reloads
//! the document from disk, runs a closure against it and publishes the
//! result (disk first, then memory) only when the closure succeeds. A
//! failed unit of work leaves no trace. Other processes sharing the data
//! directory therefore never lose each other's commits.

pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod file_io;
pub mod items;
pub mod lock;
pub mod merchants;
pub mod transactions;

pub use accounts::AccountTable;
pub use budgets::BudgetTable;
pub use categories::CategoryTable;
pub use file_io::{read_json, write_json_atomic};
pub use items::ItemTable;
pub use lock::FileLock;
pub use merchants::MerchantTable;
pub use transactions::TransactionTable;

use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};

use crate::config::paths::LedgerPaths;
use crate::error::{LedgerError, LedgerResult};

fn default_schema_version() -> u32 {
    1
}

/// Every table of the ledger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerState {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub items: ItemTable,
    #[serde(default)]
    pub accounts: AccountTable,
    #[serde(default)]
    pub transactions: TransactionTable,
    #[serde(default)]
    pub merchants: MerchantTable,
    #[serde(default)]
    pub categories: CategoryTable,
    #[serde(default)]
    pub budgets: BudgetTable,
}

/// Main storage coordinator
pub struct Storage {
    paths: LedgerPaths,
    state: RwLock<Arc<LedgerState>>,
    /// Serializes units of work
    writer: Mutex<()>,
}

impl Storage {
    /// Create a Storage instance and load the ledger from disk
    pub fn open(paths: LedgerPaths) -> LedgerResult<Self> {
        paths.ensure_directories()?;

        let storage = Self {
            paths,
            state: RwLock::new(Arc::new(LedgerState::default())),
            writer: Mutex::new(()),
        };
        storage.load()?;
        Ok(storage)
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &LedgerPaths {
        &self.paths
    }

    /// Reload the ledger document from disk
    pub fn load(&self) -> LedgerResult<()> {
        let _guard = self
            .writer
            .lock()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire writer lock: {}", e)))?;
        let loaded: LedgerState = read_json(self.paths.ledger_file())?;
        self.publish(loaded)
    }

    /// Current committed state
    pub fn snapshot(&self) -> LedgerResult<Arc<LedgerState>> {
        let state = self
            .state
            .read()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(Arc::clone(&state))
    }

    /// Run a read-only query against the committed state
    pub fn read<T>(&self, f: impl FnOnce(&LedgerState) -> T) -> LedgerResult<T> {
        let snapshot = self.snapshot()?;
        Ok(f(&snapshot))
    }

    /// Run a unit of work. Changes made by `f` are persisted and published
    /// only if it returns `Ok`.
    ///
    /// `f` always sees the latest document on disk, including commits made
    /// by other processes since this handle last loaded it.
    pub fn transact<T>(
        &self,
        f: impl FnOnce(&mut LedgerState) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let _guard = self
            .writer
            .lock()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire writer lock: {}", e)))?;
        let _file_lock = FileLock::acquire(self.paths.ledger_lock_file())?;

        let mut working: LedgerState = read_json(self.paths.ledger_file())?;
        let output = f(&mut working)?;

        write_json_atomic(self.paths.ledger_file(), &working)?;
        self.publish(working)?;

        Ok(output)
    }

    /// Take the cross-process lease on an item. Blocks until no other
    /// process is synchronizing it.
    pub fn lock_item(&self, item_id: &str) -> LedgerResult<FileLock> {
        FileLock::acquire(self.paths.item_lock_file(item_id))
    }

    fn publish(&self, next: LedgerState) -> LedgerResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        *state = Arc::new(next);
        Ok(())
    }

    /// Check if storage has been initialized (settings file written)
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProviderItem;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_storage_creation() {
        let (temp_dir, storage) = create_test_storage();

        assert!(temp_dir.path().join("data").exists());
        assert!(!storage.is_initialized());
        assert_eq!(storage.read(|s| s.transactions.count()).unwrap(), 0);
    }

    #[test]
    fn test_transact_persists_and_reloads() {
        let (temp_dir, storage) = create_test_storage();

        storage
            .transact(|state| {
                state.items.upsert(ProviderItem::new("item-1", "token"));
                Ok(())
            })
            .unwrap();

        let reopened =
            Storage::open(LedgerPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        assert!(reopened.read(|s| s.items.contains("item-1")).unwrap());
    }

    #[test]
    fn test_failed_transact_discards_changes() {
        let (temp_dir, storage) = create_test_storage();

        let result: LedgerResult<()> = storage.transact(|state| {
            state.items.upsert(ProviderItem::new("item-1", "token"));
            Err(LedgerError::Reconciliation("boom".into()))
        });

        assert!(result.is_err());
        assert!(!storage.read(|s| s.items.contains("item-1")).unwrap());
        assert!(!temp_dir.path().join("data").join("ledger.json").exists());
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_writes() {
        let (_temp_dir, storage) = create_test_storage();
        let before = storage.snapshot().unwrap();

        storage
            .transact(|state| {
                state.items.upsert(ProviderItem::new("item-1", "token"));
                Ok(())
            })
            .unwrap();

        assert!(!before.items.contains("item-1"));
        assert!(storage.read(|s| s.items.contains("item-1")).unwrap());
    }

    #[test]
    fn test_handles_on_same_directory_keep_each_others_writes() {
        let (temp_dir, first) = create_test_storage();
        let second =
            Storage::open(LedgerPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();

        first
            .transact(|state| {
                state.items.upsert(ProviderItem::new("item-a", "token-a"));
                Ok(())
            })
            .unwrap();
        second
            .transact(|state| {
                state.items.upsert(ProviderItem::new("item-b", "token-b"));
                Ok(())
            })
            .unwrap();

        assert!(second.read(|s| s.items.contains("item-a")).unwrap());
        assert!(!first.read(|s| s.items.contains("item-b")).unwrap());
        first.load().unwrap();
        assert!(first.read(|s| s.items.contains("item-b")).unwrap());

        let reopened =
            Storage::open(LedgerPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        assert_eq!(reopened.read(|s| s.items.get_all().len()).unwrap(), 2);
    }

    #[test]
    fn test_concurrent_handles_lose_no_commits() {
        let (temp_dir, _storage) = create_test_storage();
        let workers: Vec<_> = (0..4)
            .map(|n| {
                let base = temp_dir.path().to_path_buf();
                std::thread::spawn(move || {
                    let storage = Storage::open(LedgerPaths::with_base_dir(base)).unwrap();
                    for i in 0..5 {
                        storage
                            .transact(|state| {
                                let id = format!("item-{}-{}", n, i);
                                state.items.upsert(ProviderItem::new(id, "token"));
                                Ok(())
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let reopened =
            Storage::open(LedgerPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        assert_eq!(reopened.read(|s| s.items.get_all().len()).unwrap(), 20);
    }
}
