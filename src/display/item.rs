//! Item and account tables

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{Account, ProviderItem};

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "Item")]
    item_id: String,
    #[tabled(rename = "Institution")]
    institution: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Last synced")]
    last_synced: String,
}

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "Account")]
    name: String,
    #[tabled(rename = "Type")]
    account_type: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Available")]
    available: String,
    #[tabled(rename = "Currency")]
    currency: String,
}

/// Format linked items as a table
pub fn format_item_table(items: &[ProviderItem]) -> String {
    if items.is_empty() {
        return "No items linked.\n\nRun 'envelope-ledger item add' to link one.\n".to_string();
    }

    let rows = items.iter().map(|item| ItemRow {
        item_id: item.item_id.clone(),
        institution: item.institution_name.clone().unwrap_or_default(),
        status: item.status.to_string(),
        last_synced: item
            .last_synced
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string()),
    });

    format!("{}\n", Table::new(rows).with(Style::psql()))
}

/// Format accounts with their latest balances
pub fn format_account_table(accounts: &[Account]) -> String {
    if accounts.is_empty() {
        return "No accounts found. Sync the item first.\n".to_string();
    }

    let rows = accounts.iter().map(|account| AccountRow {
        name: account.name.clone(),
        account_type: account.account_type.to_string(),
        current: account.balance.current.to_string(),
        available: account
            .balance
            .available
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".to_string()),
        currency: account.currency.clone(),
    });

    format!("{}\n", Table::new(rows).with(Style::psql()))
}
