//! Category display formatting
//!
//! Formats categories and their subcategories as a tree.

use crate::services::category::CategoryWithSubcategories;

/// Format categories as a tree of subcategories
pub fn format_category_tree(categories: &[CategoryWithSubcategories]) -> String {
    if categories.is_empty() {
        return "No categories found.\n\nRun 'envelope-ledger init' to create default categories.\n"
            .to_string();
    }

    let mut output = String::new();

    for (i, cws) in categories.iter().enumerate() {
        output.push_str(&format!("{}\n", cws.category.name));

        if cws.subcategories.is_empty() {
            output.push_str("  (no subcategories)\n");
        } else {
            for (j, sub) in cws.subcategories.iter().enumerate() {
                let is_last = j == cws.subcategories.len() - 1;
                let prefix = if is_last { "└── " } else { "├── " };
                output.push_str(&format!("  {}{}\n", prefix, sub.name));
            }
        }

        if i < categories.len() - 1 {
            output.push('\n');
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Subcategory};

    #[test]
    fn test_format_category_tree() {
        let food = Category::new("Food");
        let groceries = Subcategory::new("Groceries", food.id);
        let dining = Subcategory::new("Dining Out", food.id);
        let empty = Category::new("Misc");

        let output = format_category_tree(&[
            CategoryWithSubcategories {
                category: food,
                subcategories: vec![groceries, dining],
            },
            CategoryWithSubcategories {
                category: empty,
                subcategories: vec![],
            },
        ]);

        assert!(output.contains("Food\n  ├── Groceries\n  └── Dining Out\n"));
        assert!(output.contains("Misc\n  (no subcategories)"));
    }

    #[test]
    fn test_empty_tree() {
        assert!(format_category_tree(&[]).contains("No categories found"));
    }
}
