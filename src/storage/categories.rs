//! Category and Subcategory table

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{Category, CategoryId, Subcategory, SubcategoryId};

/// Serializable category data structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryData {
    pub categories: Vec<Category>,
    pub subcategories: Vec<Subcategory>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "CategoryData", into = "CategoryData")]
pub struct CategoryTable {
    categories: HashMap<CategoryId, Category>,
    subcategories: HashMap<SubcategoryId, Subcategory>,
}

impl From<CategoryData> for CategoryTable {
    fn from(file_data: CategoryData) -> Self {
        Self {
            categories: file_data
                .categories
                .into_iter()
                .map(|c| (c.id, c))
                .collect(),
            subcategories: file_data
                .subcategories
                .into_iter()
                .map(|s| (s.id, s))
                .collect(),
        }
    }
}

impl From<CategoryTable> for CategoryData {
    fn from(table: CategoryTable) -> Self {
        let mut categories: Vec<_> = table.categories.into_values().collect();
        categories.sort_by_key(|c| (c.sort_order, c.name.clone()));

        let mut subcategories: Vec<_> = table.subcategories.into_values().collect();
        subcategories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        Self {
            categories,
            subcategories,
        }
    }
}

impl CategoryTable {
    // Category operations

    /// Get a category by ID
    pub fn get_category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.get(&id)
    }

    /// Get a category by name (case-insensitive)
    pub fn get_category_by_name(&self, name: &str) -> Option<&Category> {
        let name_lower = name.trim().to_lowercase();
        self.categories
            .values()
            .find(|c| c.name.to_lowercase() == name_lower)
    }

    /// All categories in display order
    pub fn get_all_categories(&self) -> Vec<&Category> {
        let mut list: Vec<_> = self.categories.values().collect();
        list.sort_by_key(|c| (c.sort_order, c.name.clone()));
        list
    }

    pub fn upsert_category(&mut self, category: Category) {
        self.categories.insert(category.id, category);
    }

    /// Delete a category together with its subcategories
    pub fn remove_category(&mut self, id: CategoryId) -> Option<Category> {
        self.subcategories.retain(|_, s| s.category_id != id);
        self.categories.remove(&id)
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    // Subcategory operations

    /// Get a subcategory by ID
    pub fn get_subcategory(&self, id: SubcategoryId) -> Option<&Subcategory> {
        self.subcategories.get(&id)
    }

    /// Find a subcategory by category name and subcategory name
    pub fn find_subcategory(&self, category_name: &str, name: &str) -> Option<&Subcategory> {
        let category = self.get_category_by_name(category_name)?;
        self.get_subcategory_in(category.id, name)
    }

    /// Find a subcategory by name within a category (case-insensitive)
    pub fn get_subcategory_in(&self, category_id: CategoryId, name: &str) -> Option<&Subcategory> {
        let name_lower = name.trim().to_lowercase();
        self.subcategories
            .values()
            .find(|s| s.category_id == category_id && s.name.to_lowercase() == name_lower)
    }

    /// Find subcategories by name across all categories
    pub fn find_subcategories_by_name(&self, name: &str) -> Vec<&Subcategory> {
        let name_lower = name.trim().to_lowercase();
        let mut matches: Vec<_> = self
            .subcategories
            .values()
            .filter(|s| s.name.to_lowercase() == name_lower)
            .collect();
        matches.sort_by_key(|s| s.id);
        matches
    }

    /// Subcategories of one category, sorted by name
    pub fn get_subcategories_of(&self, category_id: CategoryId) -> Vec<&Subcategory> {
        let mut list: Vec<_> = self
            .subcategories
            .values()
            .filter(|s| s.category_id == category_id)
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// All subcategories grouped by category display order
    pub fn get_all_subcategories(&self) -> Vec<&Subcategory> {
        self.get_all_categories()
            .into_iter()
            .flat_map(|c| self.get_subcategories_of(c.id))
            .collect()
    }

    pub fn upsert_subcategory(&mut self, subcategory: Subcategory) {
        self.subcategories.insert(subcategory.id, subcategory);
    }

    pub fn remove_subcategory(&mut self, id: SubcategoryId) -> Option<Subcategory> {
        self.subcategories.remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_and_subcategory_lookup() {
        let mut table = CategoryTable::default();
        let needs = Category::with_sort_order("Needs", 1);
        let groceries = Subcategory::new("Groceries", needs.id);
        let groceries_id = groceries.id;
        table.upsert_category(needs.clone());
        table.upsert_subcategory(groceries);

        assert_eq!(table.get_category_by_name("needs").unwrap().id, needs.id);
        assert_eq!(
            table.find_subcategory("Needs", "groceries").unwrap().id,
            groceries_id
        );
        assert!(table.find_subcategory("Wants", "Groceries").is_none());
        assert_eq!(table.get_all_subcategories().len(), 1);
    }

    #[test]
    fn test_remove_category_removes_subcategories() {
        let mut table = CategoryTable::default();
        let bills = Category::new("Bills");
        table.upsert_subcategory(Subcategory::new("Rent", bills.id));
        let bills_id = bills.id;
        table.upsert_category(bills);

        assert!(table.remove_category(bills_id).is_some());
        assert!(table.get_subcategories_of(bills_id).is_empty());
        assert_eq!(table.category_count(), 0);
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut table = CategoryTable::default();
        let bills = Category::new("Bills");
        table.upsert_subcategory(Subcategory::new("Rent", bills.id));
        table.upsert_category(bills);

        let json = serde_json::to_string(&table).unwrap();
        let loaded: CategoryTable = serde_json::from_str(&json).unwrap();
        assert!(loaded.find_subcategory("Bills", "Rent").is_some());
    }
}
