//! Service layer for envelope-ledger
//!
//! Services hold the business rules on top of the storage layer: validation,
//! derived balances, and operations that touch more than one table.

pub mod budget;
pub mod category;
pub mod item;
pub mod merchant;
pub mod notification;
pub mod reconciler;
pub mod report;
pub mod spending;
pub mod transaction;
pub mod transfer;

pub use budget::{BudgetOverview, BudgetService, Clock, FixedClock, SystemClock};
pub use category::{CategoryService, CategoryWithSubcategories};
pub use item::ItemService;
pub use merchant::MerchantService;
pub use notification::{Acknowledgement, Notification, NotificationIntake, NotificationOutcome};
pub use reconciler::{LedgerReconciler, SyncState, SyncSummary};
pub use report::{BalanceTotals, IncomeVsSpending, ReportService, SpendingBreakdown};
pub use transaction::{SplitRequest, TransactionFilter, TransactionService};
pub use transfer::{TransferMatcher, TransferService};
