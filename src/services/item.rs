//! Provider item service
//!
//! Registration of linked provider logins, status changes reported by
//! notifications, and account listing per item.

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Account, ItemStatus, ProviderItem};
use crate::storage::Storage;

/// Service for provider items
pub struct ItemService<'a> {
    storage: &'a Storage,
}

impl<'a> ItemService<'a> {
    /// Create a new item service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Register a linked item
    pub fn add(
        &self,
        item_id: &str,
        access_token: &str,
        institution_name: Option<String>,
    ) -> LedgerResult<ProviderItem> {
        let item_id = item_id.trim();
        if item_id.is_empty() {
            return Err(LedgerError::Validation("Item id cannot be empty".into()));
        }
        if access_token.trim().is_empty() {
            return Err(LedgerError::Validation("Access token cannot be empty".into()));
        }

        self.storage.transact(|state| {
            if state.items.contains(item_id) {
                return Err(LedgerError::Duplicate {
                    entity_type: "Item",
                    identifier: item_id.to_string(),
                });
            }

            let mut item = ProviderItem::new(item_id, access_token.trim());
            item.institution_name = institution_name.filter(|n| !n.trim().is_empty());
            state.items.upsert(item.clone());

            tracing::info!(item_id = %item.item_id, "Registered item");
            Ok(item)
        })
    }

    pub fn get(&self, item_id: &str) -> LedgerResult<ProviderItem> {
        self.storage
            .read(|state| state.items.get(item_id).cloned())?
            .ok_or_else(|| LedgerError::item_not_found(item_id))
    }

    /// List all items sorted by id
    pub fn list(&self) -> LedgerResult<Vec<ProviderItem>> {
        self.storage
            .read(|state| state.items.get_all().into_iter().cloned().collect())
    }

    /// Accounts linked through an item
    pub fn accounts(&self, item_id: &str) -> LedgerResult<Vec<Account>> {
        self.storage
            .read(|state| state.accounts.get_by_item(item_id).into_iter().cloned().collect())
    }

    /// Record a status change for an item
    pub fn set_status(&self, item_id: &str, status: ItemStatus) -> LedgerResult<ProviderItem> {
        self.storage.transact(|state| {
            let item = state
                .items
                .get_mut(item_id)
                .ok_or_else(|| LedgerError::item_not_found(item_id))?;
            item.set_status(status);

            tracing::info!(item_id = %item.item_id, status = %item.status, "Item status changed");
            Ok(item.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::LedgerPaths;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_add_and_list() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ItemService::new(&storage);

        let item = service
            .add("item-1", "access-sandbox-1", Some("First Platypus Bank".into()))
            .unwrap();
        assert!(item.cursor.is_none());
        assert_eq!(item.status, ItemStatus::Healthy);

        let items = service.list().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].institution_name.as_deref(), Some("First Platypus Bank"));
    }

    #[test]
    fn test_duplicate_and_invalid_items() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ItemService::new(&storage);

        service.add("item-1", "token", None).unwrap();
        assert!(matches!(
            service.add("item-1", "token", None).unwrap_err(),
            LedgerError::Duplicate { .. }
        ));
        assert!(service.add(" ", "token", None).unwrap_err().is_validation());
        assert!(service.add("item-2", "", None).unwrap_err().is_validation());
    }

    #[test]
    fn test_set_status() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ItemService::new(&storage);
        service.add("item-1", "token", None).unwrap();

        let item = service
            .set_status(
                "item-1",
                ItemStatus::LoginRequired {
                    reason: "ITEM_LOGIN_REQUIRED".into(),
                },
            )
            .unwrap();
        assert!(matches!(item.status, ItemStatus::LoginRequired { .. }));
        assert!(service
            .set_status("missing", ItemStatus::PendingExpiration)
            .unwrap_err()
            .is_not_found());
    }
}
