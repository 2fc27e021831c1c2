//! Spending aggregation
//!
//! Monthly activity for an envelope is the absolute value of the net of
//! everything charged to its subcategory in the period: direct assignments
//! plus split portions. Transfers never count.

use std::collections::HashMap;

use crate::models::{BudgetPeriod, Money, SubcategoryId, Transaction};
use crate::storage::TransactionTable;

fn net_for(txn: &Transaction, subcategory_id: SubcategoryId) -> Money {
    if txn.is_split {
        txn.splits
            .iter()
            .filter(|s| s.subcategory_id == subcategory_id)
            .map(|s| s.amount)
            .sum()
    } else if txn.subcategory_id == Some(subcategory_id) {
        txn.amount
    } else {
        Money::zero()
    }
}

/// Activity for one subcategory in a period
pub fn monthly_activity(
    transactions: &TransactionTable,
    subcategory_id: SubcategoryId,
    period: BudgetPeriod,
) -> Money {
    let net: Money = transactions
        .get_by_subcategory(subcategory_id)
        .into_iter()
        .filter(|t| !t.is_transfer && period.contains(t.date))
        .map(|t| net_for(t, subcategory_id))
        .sum();
    net.abs()
}

/// Activity for every subcategory touched in a period
pub fn activity_by_subcategory(
    transactions: &TransactionTable,
    period: BudgetPeriod,
) -> HashMap<SubcategoryId, Money> {
    let mut net: HashMap<SubcategoryId, Money> = HashMap::new();

    for txn in transactions
        .get_by_date_range(period.start_date(), period.end_date())
        .into_iter()
        .filter(|t| !t.is_transfer)
    {
        if txn.is_split {
            for split in &txn.splits {
                *net.entry(split.subcategory_id).or_default() += split.amount;
            }
        } else if let Some(sub) = txn.subcategory_id {
            *net.entry(sub).or_default() += txn.amount;
        }
    }

    net.into_iter().map(|(sub, m)| (sub, m.abs())).collect()
}
