//! Category and Subcategory models
//!
//! Categories group subcategories for display. Transactions, splits and
//! budget envelopes always point at a subcategory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CategoryId, SubcategoryId};

/// Category that receives auto-assigned transfers
pub const TRANSFERS_CATEGORY: &str = "Transfers";

/// Subcategory that receives auto-assigned transfers
pub const ACCOUNT_TRANSFER_SUBCATEGORY: &str = "Account Transfer";

/// A top-level budget category (e.g., "Bills", "Needs")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: CategoryId,

    /// Category name, unique across categories
    pub name: String,

    /// Hex color for display
    #[serde(default)]
    pub color: Option<String>,

    #[serde(default)]
    pub icon: Option<String>,

    /// Sort order for display
    pub sort_order: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Create a new category
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CategoryId::new(),
            name: name.into(),
            color: None,
            icon: None,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new category with a specific sort order
    pub fn with_sort_order(name: impl Into<String>, sort_order: i32) -> Self {
        let mut category = Self::new(name);
        category.sort_order = sort_order;
        category
    }

    /// Validate the category
    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        validate_name(&self.name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A subcategory within a category; the unit budgets are tracked by
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subcategory {
    /// Unique identifier
    pub id: SubcategoryId,

    /// The category this subcategory belongs to
    pub category_id: CategoryId,

    /// Name, unique within its category
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subcategory {
    /// Create a new subcategory
    pub fn new(name: impl Into<String>, category_id: CategoryId) -> Self {
        let now = Utc::now();
        Self {
            id: SubcategoryId::new(),
            category_id,
            name: name.into(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate the subcategory
    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        validate_name(&self.name)
    }
}

impl fmt::Display for Subcategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn validate_name(name: &str) -> Result<(), CategoryValidationError> {
    if name.trim().is_empty() {
        return Err(CategoryValidationError::EmptyName);
    }

    if name.len() > 50 {
        return Err(CategoryValidationError::NameTooLong(name.len()));
    }

    Ok(())
}

/// Default categories seeded into an empty ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultCategory {
    Bills,
    Needs,
    Wants,
    Savings,
    Debt,
    Income,
    Transfers,
    Other,
}

impl DefaultCategory {
    /// Get all default categories in order
    pub fn all() -> &'static [Self] {
        &[
            Self::Bills,
            Self::Needs,
            Self::Wants,
            Self::Savings,
            Self::Debt,
            Self::Income,
            Self::Transfers,
            Self::Other,
        ]
    }

    /// Get the name for this default category
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bills => "Bills",
            Self::Needs => "Needs",
            Self::Wants => "Wants",
            Self::Savings => "Savings & Investments",
            Self::Debt => "Debt",
            Self::Income => "Income",
            Self::Transfers => TRANSFERS_CATEGORY,
            Self::Other => "Other",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Bills => "#FF5252",
            Self::Needs => "#4CAF50",
            Self::Wants => "#2196F3",
            Self::Savings => "#FFC107",
            Self::Debt => "#9C27B0",
            Self::Income => "#00BCD4",
            Self::Transfers | Self::Other => "#607D8B",
        }
    }

    pub fn subcategory_names(&self) -> &'static [&'static str] {
        match self {
            Self::Bills => &[
                "Rent",
                "Utilities",
                "Insurance",
                "Phone",
                "Internet",
                "Subscriptions",
                "Gym Membership",
            ],
            Self::Needs => &[
                "Groceries",
                "Gas",
                "Public Transit",
                "Healthcare",
                "Car Maintenance",
                "Household Supplies",
            ],
            Self::Wants => &[
                "Dining Out",
                "Entertainment",
                "Shopping",
                "Gifts",
                "Hobbies",
                "Cigarettes & Alcohol",
            ],
            Self::Savings => &["Emergency Fund", "General Savings", "Travel"],
            Self::Debt => &["Student Loans"],
            Self::Income => &["Salary", "Refunds", "Other Income"],
            Self::Transfers => &[ACCOUNT_TRANSFER_SUBCATEGORY, "Credit Card Payment"],
            Self::Other => &["Miscellaneous"],
        }
    }

    /// Build the category and its subcategories
    pub fn build(&self, sort_order: i32) -> (Category, Vec<Subcategory>) {
        let mut category = Category::with_sort_order(self.name(), sort_order);
        category.color = Some(self.color().to_string());
        let subcategories = self
            .subcategory_names()
            .iter()
            .map(|name| Subcategory::new(*name, category.id))
            .collect();
        (category, subcategories)
    }
}

/// Validation errors for categories and subcategories
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CategoryValidationError {
    #[error("Category name cannot be empty")]
    EmptyName,
    #[error("Category name too long ({0} chars, max 50)")]
    NameTooLong(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_subcategory() {
        let category = Category::new("Needs");
        let sub = Subcategory::new("Groceries", category.id);

        assert_eq!(sub.name, "Groceries");
        assert_eq!(sub.category_id, category.id);
    }

    #[test]
    fn test_validation() {
        let mut category = Category::new("Valid");
        assert!(category.validate().is_ok());

        category.name = String::new();
        assert_eq!(category.validate(), Err(CategoryValidationError::EmptyName));

        let sub = Subcategory::new("a".repeat(51), category.id);
        assert!(matches!(
            sub.validate(),
            Err(CategoryValidationError::NameTooLong(51))
        ));
    }

    #[test]
    fn test_default_taxonomy() {
        let defaults = DefaultCategory::all();
        assert_eq!(defaults.len(), 8);
        assert_eq!(defaults[0].name(), "Bills");

        let (transfers, subs) = DefaultCategory::Transfers.build(6);
        assert_eq!(transfers.name, TRANSFERS_CATEGORY);
        assert_eq!(transfers.sort_order, 6);
        assert!(subs
            .iter()
            .any(|s| s.name == ACCOUNT_TRANSFER_SUBCATEGORY && s.category_id == transfers.id));
    }

    #[test]
    fn test_serialization() {
        let category = Category::new("Test Category");
        let json = serde_json::to_string(&category).unwrap();
        let deserialized: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(category.id, deserialized.id);
        assert_eq!(category.name, deserialized.name);
    }
}
