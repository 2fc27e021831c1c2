//! Category service
//!
//! Category and subcategory creation, lookup, guarded deletion and seeding
//! of the default taxonomy.

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Category, CategoryId, DefaultCategory, Subcategory, SubcategoryId};
use crate::storage::{LedgerState, Storage};

/// Service for category management
pub struct CategoryService<'a> {
    storage: &'a Storage,
}

/// A category with its subcategories
#[derive(Debug, Clone)]
pub struct CategoryWithSubcategories {
    pub category: Category,
    pub subcategories: Vec<Subcategory>,
}

/// Why a subcategory cannot be deleted, if it can't
fn usage_of(state: &LedgerState, subcategory_id: SubcategoryId) -> Option<String> {
    let assigned = state.transactions.get_by_subcategory(subcategory_id).len();
    if assigned > 0 {
        return Some(format!("{} transaction(s) assigned", assigned));
    }

    let predicted = state
        .transactions
        .iter()
        .filter(|t| t.predicted_subcategory_id == Some(subcategory_id))
        .count();
    if predicted > 0 {
        return Some(format!("{} transaction(s) predicted", predicted));
    }

    None
}

impl<'a> CategoryService<'a> {
    /// Create a new category service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Seed the default taxonomy into an empty ledger. Returns the number
    /// of categories created (0 when categories already exist).
    pub fn seed_defaults(&self) -> LedgerResult<usize> {
        self.storage.transact(|state| {
            if state.categories.category_count() > 0 {
                return Ok(0);
            }

            let defaults = DefaultCategory::all();
            for (order, default) in defaults.iter().enumerate() {
                let (category, subcategories) = default.build(order as i32);
                state.categories.upsert_category(category);
                for sub in subcategories {
                    state.categories.upsert_subcategory(sub);
                }
            }

            tracing::info!(categories = defaults.len(), "Seeded default categories");
            Ok(defaults.len())
        })
    }

    // === Category Operations ===

    /// Create a new category
    pub fn create_category(&self, name: &str) -> LedgerResult<Category> {
        let name = name.trim();
        self.storage.transact(|state| {
            if state.categories.get_category_by_name(name).is_some() {
                return Err(LedgerError::Duplicate {
                    entity_type: "Category",
                    identifier: name.to_string(),
                });
            }

            let max_order = state
                .categories
                .get_all_categories()
                .iter()
                .map(|c| c.sort_order)
                .max()
                .unwrap_or(-1);

            let category = Category::with_sort_order(name, max_order + 1);
            category
                .validate()
                .map_err(|e| LedgerError::Validation(e.to_string()))?;

            state.categories.upsert_category(category.clone());
            Ok(category)
        })
    }

    /// Find a category by name or ID string
    pub fn find_category(&self, identifier: &str) -> LedgerResult<Option<Category>> {
        self.storage.read(|state| {
            if let Some(category) = state.categories.get_category_by_name(identifier) {
                return Some(category.clone());
            }
            identifier
                .parse::<CategoryId>()
                .ok()
                .and_then(|id| state.categories.get_category(id))
                .cloned()
        })
    }

    /// List all categories with their subcategories, in display order
    pub fn list(&self) -> LedgerResult<Vec<CategoryWithSubcategories>> {
        self.storage.read(|state| {
            state
                .categories
                .get_all_categories()
                .into_iter()
                .map(|category| CategoryWithSubcategories {
                    category: category.clone(),
                    subcategories: state
                        .categories
                        .get_subcategories_of(category.id)
                        .into_iter()
                        .cloned()
                        .collect(),
                })
                .collect()
        })
    }

    /// Delete a category and its subcategories
    ///
    /// Fails with `InUse` if any of its subcategories is still referenced.
    pub fn delete_category(&self, id: CategoryId) -> LedgerResult<()> {
        self.storage.transact(|state| {
            let category = state
                .categories
                .get_category(id)
                .cloned()
                .ok_or_else(|| LedgerError::category_not_found(id.to_string()))?;

            let subcategories: Vec<SubcategoryId> = state
                .categories
                .get_subcategories_of(id)
                .iter()
                .map(|s| s.id)
                .collect();

            for sub in &subcategories {
                if let Some(reason) = usage_of(state, *sub) {
                    return Err(LedgerError::InUse {
                        entity_type: "Category",
                        identifier: category.name.clone(),
                        reason,
                    });
                }
            }

            for sub in subcategories {
                state.budgets.remove_envelopes(sub);
            }
            state.categories.remove_category(id);
            tracing::info!(category = %category.name, "Deleted category");
            Ok(())
        })
    }

    // === Subcategory Operations ===

    /// Create a subcategory inside a category
    pub fn create_subcategory(&self, category_id: CategoryId, name: &str) -> LedgerResult<Subcategory> {
        let name = name.trim();
        self.storage.transact(|state| {
            if state.categories.get_category(category_id).is_none() {
                return Err(LedgerError::category_not_found(category_id.to_string()));
            }

            if state.categories.get_subcategory_in(category_id, name).is_some() {
                return Err(LedgerError::Duplicate {
                    entity_type: "Subcategory",
                    identifier: name.to_string(),
                });
            }

            let subcategory = Subcategory::new(name, category_id);
            subcategory
                .validate()
                .map_err(|e| LedgerError::Validation(e.to_string()))?;

            state.categories.upsert_subcategory(subcategory.clone());
            Ok(subcategory)
        })
    }

    /// Find a subcategory by ID, by `Category/Subcategory`, or by a name
    /// that is unique across categories
    pub fn find_subcategory(&self, identifier: &str) -> LedgerResult<Option<Subcategory>> {
        self.storage.read(|state| {
            if let Ok(id) = identifier.parse::<SubcategoryId>() {
                if let Some(sub) = state.categories.get_subcategory(id) {
                    return Ok(Some(sub.clone()));
                }
            }

            if let Some((category, name)) = identifier.split_once('/') {
                return Ok(state.categories.find_subcategory(category, name).cloned());
            }

            match state.categories.find_subcategories_by_name(identifier).as_slice() {
                [] => Ok(None),
                [only] => Ok(Some((*only).clone())),
                _ => Err(LedgerError::Validation(format!(
                    "Subcategory name '{}' is ambiguous; use Category/Subcategory",
                    identifier
                ))),
            }
        })?
    }

    /// Delete a subcategory
    ///
    /// Fails with `InUse` while any transaction or split references it.
    pub fn delete_subcategory(&self, id: SubcategoryId) -> LedgerResult<()> {
        self.storage.transact(|state| {
            let subcategory = state
                .categories
                .get_subcategory(id)
                .cloned()
                .ok_or_else(|| LedgerError::subcategory_not_found(id.to_string()))?;

            if let Some(reason) = usage_of(state, id) {
                return Err(LedgerError::InUse {
                    entity_type: "Subcategory",
                    identifier: subcategory.name,
                    reason,
                });
            }

            state.budgets.remove_envelopes(id);
            state.categories.remove_subcategory(id);
            tracing::info!(subcategory = %subcategory.name, "Deleted subcategory");
            Ok(())
        })
    }
}
