//! Display formatting for terminal output
//!
//! Turns ledger models into the tables and trees printed by the CLI.

pub mod budget;
pub mod category;
pub mod item;
pub mod report;
pub mod transaction;

pub use budget::format_budget_overview;
pub use category::format_category_tree;
pub use item::{format_account_table, format_item_table};
pub use report::{format_balance_totals, format_income_vs_spending, format_spending_breakdown};
pub use transaction::{format_transaction_details, format_transaction_register};
