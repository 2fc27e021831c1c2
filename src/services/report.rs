//! Spending and balance reports
//!
//! Read-only aggregates over the synchronized ledger. Transfers are
//! excluded from every flow figure since they net to zero across the
//! user's accounts. Date ranges are inclusive; an open end is unbounded.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Money, SubcategoryId, Transaction};
use crate::storage::{LedgerState, Storage};

/// Label for outflows with no subcategory
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Outflow charged to one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySpending {
    pub category: String,
    pub amount: Money,
}

/// Outflow per category, largest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendingBreakdown {
    pub categories: Vec<CategorySpending>,
    pub total: Money,
}

/// Inflow against outflow for a range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncomeVsSpending {
    pub income: Money,
    pub spending: Money,
    pub net: Money,
}

/// Total of account balances with debt subtracted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceTotals {
    pub assets: Money,
    pub liabilities: Money,
    pub total: Money,
}

fn in_range(txn: &Transaction, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    start.map_or(true, |s| txn.date >= s) && end.map_or(true, |e| txn.date <= e)
}

fn flows<'s>(
    state: &'s LedgerState,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> impl Iterator<Item = &'s Transaction> {
    state
        .transactions
        .iter()
        .filter(move |t| !t.is_transfer && in_range(t, start, end))
}

fn category_name(state: &LedgerState, subcategory_id: Option<SubcategoryId>) -> String {
    subcategory_id
        .and_then(|id| state.categories.get_subcategory(id))
        .and_then(|sub| state.categories.get_category(sub.category_id))
        .map(|cat| cat.name.clone())
        .unwrap_or_else(|| UNCATEGORIZED.to_string())
}

/// Build the per-category outflow breakdown from a state
pub fn spending_breakdown(
    state: &LedgerState,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> SpendingBreakdown {
    let mut totals: HashMap<String, Money> = HashMap::new();

    for txn in flows(state, start, end) {
        if txn.is_split {
            for split in txn.splits.iter().filter(|s| s.amount.is_negative()) {
                *totals
                    .entry(category_name(state, Some(split.subcategory_id)))
                    .or_default() += split.amount.abs();
            }
        } else if txn.amount.is_negative() {
            *totals.entry(category_name(state, txn.subcategory_id)).or_default() +=
                txn.amount.abs();
        }
    }

    let mut categories: Vec<CategorySpending> = totals
        .into_iter()
        .map(|(category, amount)| CategorySpending { category, amount })
        .collect();
    categories.sort_by(|a, b| b.amount.cmp(&a.amount).then(a.category.cmp(&b.category)));

    let total = categories.iter().map(|c| c.amount).sum();
    SpendingBreakdown { categories, total }
}

/// Sum inflows and outflows from a state
pub fn income_vs_spending(
    state: &LedgerState,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> IncomeVsSpending {
    let mut income = Money::zero();
    let mut spending = Money::zero();

    for txn in flows(state, start, end) {
        if txn.amount.is_positive() {
            income += txn.amount;
        } else {
            spending += txn.amount.abs();
        }
    }

    IncomeVsSpending {
        income,
        spending,
        net: income - spending,
    }
}

/// Total current balance across accounts. Credit and loan balances are
/// amounts owed and are subtracted.
pub fn total_balance(state: &LedgerState) -> BalanceTotals {
    let mut assets = Money::zero();
    let mut liabilities = Money::zero();

    for account in state.accounts.get_all() {
        if account.account_type.is_liability() {
            liabilities += account.balance.current;
        } else {
            assets += account.balance.current;
        }
    }

    BalanceTotals {
        assets,
        liabilities,
        total: assets - liabilities,
    }
}

/// Reports over the committed ledger
pub struct ReportService<'a> {
    storage: &'a Storage,
}

impl<'a> ReportService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn check_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> LedgerResult<()> {
        match (start, end) {
            (Some(s), Some(e)) if s > e => Err(LedgerError::Validation(format!(
                "Start date {} is after end date {}",
                s, e
            ))),
            _ => Ok(()),
        }
    }

    /// Outflow per category between `start` and `end`
    pub fn spending_breakdown(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> LedgerResult<SpendingBreakdown> {
        Self::check_range(start, end)?;
        self.storage.read(|state| spending_breakdown(state, start, end))
    }

    /// Income, spending and their difference between `start` and `end`
    pub fn income_vs_spending(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> LedgerResult<IncomeVsSpending> {
        Self::check_range(start, end)?;
        self.storage.read(|state| income_vs_spending(state, start, end))
    }

    /// Balance across every account
    pub fn total_balance(&self) -> LedgerResult<BalanceTotals> {
        self.storage.read(total_balance)
    }
}
