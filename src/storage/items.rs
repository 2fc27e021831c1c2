//! Provider item table

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::ProviderItem;

/// Serializable item data structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemData {
    items: Vec<ProviderItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "ItemData", into = "ItemData")]
pub struct ItemTable {
    data: BTreeMap<String, ProviderItem>,
}

impl From<ItemData> for ItemTable {
    fn from(file_data: ItemData) -> Self {
        Self {
            data: file_data
                .items
                .into_iter()
                .map(|item| (item.item_id.clone(), item))
                .collect(),
        }
    }
}

impl From<ItemTable> for ItemData {
    fn from(table: ItemTable) -> Self {
        Self {
            items: table.data.into_values().collect(),
        }
    }
}

impl ItemTable {
    pub fn get(&self, item_id: &str) -> Option<&ProviderItem> {
        self.data.get(item_id)
    }

    pub fn get_mut(&mut self, item_id: &str) -> Option<&mut ProviderItem> {
        self.data.get_mut(item_id)
    }

    /// All items ordered by item id
    pub fn get_all(&self) -> Vec<&ProviderItem> {
        self.data.values().collect()
    }

    pub fn upsert(&mut self, item: ProviderItem) {
        self.data.insert(item.item_id.clone(), item);
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.data.contains_key(item_id)
    }
}
