//! Core data models for envelope-ledger
//!
//! This module contains the data structures for the synchronized ledger
//! (items, accounts, transactions, merchants) and the envelope budget
//! (categories, subcategories, monthly budgets).

pub mod account;
pub mod budget;
pub mod category;
pub mod ids;
pub mod item;
pub mod merchant;
pub mod money;
pub mod period;
pub mod transaction;

pub use account::{Account, AccountType, BalanceSnapshot, Institution};
pub use budget::{Budget, SubcategoryBudget, SubcategoryBudgetSummary};
pub use category::{
    Category, DefaultCategory, Subcategory, ACCOUNT_TRANSFER_SUBCATEGORY, TRANSFERS_CATEGORY,
};
pub use ids::{
    AccountId, BudgetId, CategoryId, MerchantId, SplitId, SubcategoryBudgetId, SubcategoryId,
    TransactionId,
};
pub use item::{ItemStatus, ProviderItem, SyncCursor};
pub use merchant::{ConfidenceTier, Merchant};
pub use money::Money;
pub use period::BudgetPeriod;
pub use transaction::{ProviderCategory, Transaction, TransactionSplit};
