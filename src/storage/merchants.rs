//! Merchant table
//!
//! Indexed by provider entity id and, for merchants without one, by
//! case-insensitive name.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{Merchant, MerchantId};

/// Serializable merchant data structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MerchantData {
    merchants: Vec<Merchant>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "MerchantData", into = "MerchantData")]
pub struct MerchantTable {
    data: HashMap<MerchantId, Merchant>,
    /// Index: entity id -> merchant id
    by_entity: HashMap<String, MerchantId>,
    /// Index: lowercase name -> merchant id, only for merchants without an entity id
    by_anonymous_name: HashMap<String, MerchantId>,
}

impl From<MerchantData> for MerchantTable {
    fn from(file_data: MerchantData) -> Self {
        let mut table = Self::default();
        for merchant in file_data.merchants {
            table.upsert(merchant);
        }
        table
    }
}

impl From<MerchantTable> for MerchantData {
    fn from(table: MerchantTable) -> Self {
        let mut merchants: Vec<_> = table.data.into_values().collect();
        merchants.sort_by(|a, b| a.name.cmp(&b.name).then(a.created_at.cmp(&b.created_at)));
        Self { merchants }
    }
}

impl MerchantTable {
    pub fn get(&self, id: MerchantId) -> Option<&Merchant> {
        self.data.get(&id)
    }

    /// Find a merchant by provider entity id
    pub fn get_by_entity(&self, entity_id: &str) -> Option<&Merchant> {
        self.by_entity.get(entity_id).and_then(|id| self.data.get(id))
    }

    /// Find a merchant without an entity id by name
    pub fn get_anonymous_by_name(&self, name: &str) -> Option<&Merchant> {
        self.by_anonymous_name
            .get(&name.trim().to_lowercase())
            .and_then(|id| self.data.get(id))
    }

    pub fn get_all(&self) -> Vec<&Merchant> {
        let mut merchants: Vec<_> = self.data.values().collect();
        merchants.sort_by(|a, b| a.name.cmp(&b.name));
        merchants
    }

    pub fn upsert(&mut self, merchant: Merchant) {
        if let Some(old) = self.data.get(&merchant.id) {
            match &old.entity_id {
                Some(entity) => {
                    self.by_entity.remove(entity);
                }
                None => {
                    self.by_anonymous_name.remove(&old.name.trim().to_lowercase());
                }
            }
        }

        match &merchant.entity_id {
            Some(entity) => {
                self.by_entity.insert(entity.clone(), merchant.id);
            }
            None => {
                self.by_anonymous_name
                    .insert(merchant.name.trim().to_lowercase(), merchant.id);
            }
        }

        self.data.insert(merchant.id, merchant);
    }

    pub fn count(&self) -> usize {
        self.data.len()
    }
}
