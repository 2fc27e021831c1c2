//! Item CLI commands
//!
//! Linking provider items, listing their accounts, and manual syncs.

use std::sync::Arc;

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::{format_account_table, format_item_table};
use crate::error::LedgerResult;
use crate::services::{ItemService, LedgerReconciler};
use crate::storage::Storage;

use super::build_connector;

/// Item subcommands
#[derive(Subcommand)]
pub enum ItemCommands {
    /// Register a linked provider item
    Add {
        /// Provider item id
        item_id: String,
        /// Access token issued by the provider
        #[arg(short, long)]
        token: String,
        /// Institution name shown in listings
        #[arg(short, long)]
        institution: Option<String>,
    },

    /// List linked items
    List,

    /// Show accounts linked through an item
    Accounts {
        /// Provider item id
        item_id: String,
        /// Fetch current balances from the provider first
        #[arg(long)]
        refresh: bool,
    },
}

/// Handle an item command
pub async fn handle_item_command(
    storage: &Arc<Storage>,
    settings: &Settings,
    cmd: ItemCommands,
) -> LedgerResult<()> {
    let service = ItemService::new(storage);

    match cmd {
        ItemCommands::Add {
            item_id,
            token,
            institution,
        } => {
            let item = service.add(&item_id, &token, institution)?;
            println!("Linked item: {}", item);
            println!("Run 'envelope-ledger sync {}' to fetch transactions.", item.item_id);
        }

        ItemCommands::List => {
            let items = service.list()?;
            print!("{}", format_item_table(&items));
        }

        ItemCommands::Accounts { item_id, refresh } => {
            let item = service.get(&item_id)?;
            let accounts = if refresh {
                let reconciler =
                    LedgerReconciler::new(Arc::clone(storage), build_connector(settings)?, settings);
                reconciler.refresh_balances(&item.item_id).await?
            } else {
                service.accounts(&item.item_id)?
            };

            println!("Accounts for {}:", item);
            print!("{}", format_account_table(&accounts));
        }
    }

    Ok(())
}

/// Sync one item, or every linked item when none is named
pub async fn handle_sync_command(
    storage: &Arc<Storage>,
    settings: &Settings,
    item_id: Option<String>,
) -> LedgerResult<()> {
    let reconciler = LedgerReconciler::new(Arc::clone(storage), build_connector(settings)?, settings);

    let item_ids = match item_id {
        Some(id) => vec![id],
        None => ItemService::new(storage)
            .list()?
            .into_iter()
            .map(|item| item.item_id)
            .collect(),
    };

    if item_ids.is_empty() {
        println!("No items linked.");
        return Ok(());
    }

    for item_id in item_ids {
        let summary = reconciler.sync_item(&item_id).await?;
        println!("Synced {}", summary);
    }

    Ok(())
}
