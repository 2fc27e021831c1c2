//! Transaction display formatting
//!
//! Register and detail views for synced transactions.

use std::collections::HashMap;

use crate::models::{SubcategoryId, Transaction};

/// Label used when a transaction has no direct assignment
fn category_label(txn: &Transaction, names: &HashMap<SubcategoryId, String>) -> String {
    if txn.is_split {
        return format!("Split ({})", txn.splits.len());
    }
    match txn.subcategory_id {
        Some(id) => names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string()),
        None => "(uncategorized)".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

/// Format a single register row
pub fn format_transaction_row(txn: &Transaction, names: &HashMap<SubcategoryId, String>) -> String {
    let status_icon = if txn.pending { "P" } else { " " };
    let transfer_indicator = if txn.is_transfer { "⇄ " } else { "" };

    format!(
        "{} {} {:24} {:>12}  {:22} {}",
        status_icon,
        txn.date.format("%Y-%m-%d"),
        truncate(&format!("{}{}", transfer_indicator, txn.name), 24),
        txn.amount,
        truncate(&category_label(txn, names), 22),
        txn.external_id
    )
}

/// Format transactions as a register
pub fn format_transaction_register(
    transactions: &[Transaction],
    names: &HashMap<SubcategoryId, String>,
) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:1} {:10} {:24} {:>12}  {:22} {}\n",
        "", "Date", "Name", "Amount", "Category", "Provider ID"
    ));
    output.push_str(&"-".repeat(90));
    output.push('\n');

    for txn in transactions {
        output.push_str(&format_transaction_row(txn, names));
        output.push('\n');
    }

    output
}

/// Format transaction details
pub fn format_transaction_details(
    txn: &Transaction,
    names: &HashMap<SubcategoryId, String>,
    merchant: Option<&str>,
    counterpart: Option<&Transaction>,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("Transaction: {}\n", txn.external_id));
    output.push_str(&format!("Date:        {}\n", txn.date.format("%Y-%m-%d")));
    output.push_str(&format!("Amount:      {}\n", txn.amount));
    output.push_str(&format!("Name:        {}\n", txn.name));

    if let Some(merchant) = merchant {
        output.push_str(&format!("Merchant:    {}\n", merchant));
    }

    output.push_str(&format!("Category:    {}\n", category_label(txn, names)));

    if let (Some(predicted), Some(confidence)) =
        (txn.predicted_subcategory_id, txn.predicted_confidence)
    {
        let label = names
            .get(&predicted)
            .cloned()
            .unwrap_or_else(|| predicted.to_string());
        output.push_str(&format!("Predicted:   {} ({:.0}%)\n", label, confidence * 100.0));
    }

    if txn.pending {
        output.push_str("Status:      Pending\n");
    }

    if txn.is_transfer {
        match counterpart {
            Some(other) => {
                output.push_str(&format!("Transfer:    matched with {}\n", other.external_id))
            }
            None => output.push_str("Transfer:    unmatched\n"),
        }
    }

    if txn.is_split {
        output.push_str("\nSplits:\n");
        for (i, split) in txn.splits.iter().enumerate() {
            let memo_part = match &split.memo {
                Some(memo) if !memo.is_empty() => format!(" - {}", memo),
                _ => String::new(),
            };
            let label = names
                .get(&split.subcategory_id)
                .cloned()
                .unwrap_or_else(|| split.subcategory_id.to_string());
            output.push_str(&format!("  {}. {} to {}{}\n", i + 1, split.amount, label, memo_part));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountId, Money, TransactionSplit};
    use chrono::NaiveDate;

    fn sample() -> Transaction {
        Transaction::new(
            "txn-1",
            AccountId::new(),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            Money::from_cents(-50_00),
            "Corner Grocery",
        )
    }

    #[test]
    fn test_register() {
        let txn = sample();
        let output = format_transaction_register(&[txn], &HashMap::new());
        assert!(output.contains("2025-01-15"));
        assert!(output.contains("Corner Grocery"));
        assert!(output.contains("-$50.00"));
        assert!(output.contains("(uncategorized)"));
    }

    #[test]
    fn test_details_show_splits() {
        let mut txn = sample();
        let groceries = SubcategoryId::new();
        let household = SubcategoryId::new();
        txn.replace_splits(vec![
            TransactionSplit::new(groceries, Money::from_cents(-30_00)),
            TransactionSplit::new(household, Money::from_cents(-20_00)),
        ]);

        let mut names = HashMap::new();
        names.insert(groceries, "Food/Groceries".to_string());

        let output = format_transaction_details(&txn, &names, Some("Corner Grocery"), None);
        assert!(output.contains("Split (2)"));
        assert!(output.contains("1. -$30.00 to Food/Groceries"));
        assert!(output.contains("Merchant:    Corner Grocery"));
    }

    #[test]
    fn test_empty_register() {
        assert_eq!(
            format_transaction_register(&[], &HashMap::new()),
            "No transactions found.\n"
        );
    }

    #[test]
    fn test_details_show_transfer_counterpart() {
        let mut txn = sample();
        txn.is_transfer = true;
        assert!(format_transaction_details(&txn, &HashMap::new(), None, None)
            .contains("Transfer:    unmatched"));

        let mut other = sample();
        other.external_id = "b-in".into();
        let output = format_transaction_details(&txn, &HashMap::new(), None, Some(&other));
        assert!(output.contains("Transfer:    matched with b-in"));
    }
}
