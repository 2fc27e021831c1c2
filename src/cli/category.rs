//! Category CLI commands

use clap::Subcommand;

use crate::display::format_category_tree;
use crate::error::{LedgerError, LedgerResult};
use crate::services::CategoryService;
use crate::storage::Storage;

use super::resolve_subcategory;

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List categories and their subcategories
    List,

    /// Create a category
    Add {
        /// Category name
        name: String,
    },

    /// Create a subcategory inside a category
    #[command(name = "add-sub")]
    AddSub {
        /// Category name or ID
        category: String,
        /// Subcategory name
        name: String,
    },

    /// Delete a category and its subcategories
    Remove {
        /// Category name or ID
        category: String,
    },

    /// Delete a subcategory
    #[command(name = "remove-sub")]
    RemoveSub {
        /// Subcategory ("Category/Subcategory", name, or ID)
        subcategory: String,
    },
}

/// Handle a category command
pub fn handle_category_command(storage: &Storage, cmd: CategoryCommands) -> LedgerResult<()> {
    let service = CategoryService::new(storage);

    match cmd {
        CategoryCommands::List => {
            let categories = service.list()?;
            print!("{}", format_category_tree(&categories));
        }

        CategoryCommands::Add { name } => {
            let category = service.create_category(&name)?;
            println!("Created category: {}", category.name);
            println!("  ID: {}", category.id);
        }

        CategoryCommands::AddSub { category, name } => {
            let cat = service
                .find_category(&category)?
                .ok_or_else(|| LedgerError::category_not_found(&category))?;

            let sub = service.create_subcategory(cat.id, &name)?;
            println!("Created subcategory: {}/{}", cat.name, sub.name);
            println!("  ID: {}", sub.id);
        }

        CategoryCommands::Remove { category } => {
            let cat = service
                .find_category(&category)?
                .ok_or_else(|| LedgerError::category_not_found(&category))?;

            service.delete_category(cat.id)?;
            println!("Deleted category: {}", cat.name);
        }

        CategoryCommands::RemoveSub { subcategory } => {
            let sub = resolve_subcategory(storage, &subcategory)?;
            service.delete_subcategory(sub.id)?;
            println!("Deleted subcategory: {}", sub.name);
        }
    }

    Ok(())
}
