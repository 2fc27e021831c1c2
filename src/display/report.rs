//! Report formatting

use crate::services::report::{BalanceTotals, IncomeVsSpending, SpendingBreakdown};

/// Format outflow per category with each category's share
pub fn format_spending_breakdown(report: &SpendingBreakdown) -> String {
    if report.categories.is_empty() {
        return "No spending in this range.\n".to_string();
    }

    let mut output = String::new();
    output.push_str("Spending by Category\n");
    output.push_str(&"=".repeat(52));
    output.push('\n');

    for row in &report.categories {
        let share = if report.total.is_zero() {
            0.0
        } else {
            row.amount.cents() as f64 / report.total.cents() as f64 * 100.0
        };
        output.push_str(&format!(
            "{:30} {:>13} {:>6.1}%\n",
            row.category,
            row.amount.to_string(),
            share
        ));
    }

    output.push_str(&"-".repeat(52));
    output.push('\n');
    output.push_str(&format!("{:30} {:>13}\n", "Total:", report.total.to_string()));
    output
}

pub fn format_income_vs_spending(report: &IncomeVsSpending) -> String {
    format!(
        "Income:   {:>15}\nSpending: {:>15}\n{}\nNet:      {:>15}\n",
        report.income.to_string(),
        report.spending.to_string(),
        "-".repeat(26),
        report.net.to_string()
    )
}

pub fn format_balance_totals(totals: &BalanceTotals) -> String {
    format!(
        "Assets:        {:>15}\nLiabilities:   {:>15}\n{}\nTotal balance: {:>15}\n",
        totals.assets.to_string(),
        totals.liabilities.to_string(),
        "-".repeat(31),
        totals.total.to_string()
    )
}
