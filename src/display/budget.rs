//! Budget overview formatting

use std::collections::HashMap;

use crate::models::SubcategoryId;
use crate::services::budget::BudgetOverview;

/// Format a month's envelopes with totals
pub fn format_budget_overview(
    overview: &BudgetOverview,
    names: &HashMap<SubcategoryId, String>,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("Budget: {} ({})\n", overview.name, overview.period));
    output.push_str(&"=".repeat(78));
    output.push('\n');
    output.push_str(&format!(
        "{:30} {:>11} {:>11} {:>11} {:>11}\n",
        "Envelope", "Assigned", "Target", "Activity", "Available"
    ));
    output.push_str(&"-".repeat(78));
    output.push('\n');

    let mut rows: Vec<_> = overview
        .envelopes
        .iter()
        .map(|summary| {
            let name = names
                .get(&summary.subcategory_id)
                .cloned()
                .unwrap_or_else(|| summary.subcategory_id.to_string());
            (name, summary)
        })
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));

    for (name, summary) in rows {
        let flag = if summary.is_overspent() { " ⚠" } else { "" };
        output.push_str(&format!(
            "{:30} {:>11} {:>11} {:>11} {:>11}{}\n",
            name,
            summary.monthly_assigned.to_string(),
            summary.monthly_target.to_string(),
            summary.activity.to_string(),
            summary.available.to_string(),
            flag
        ));
    }

    output.push_str(&"=".repeat(78));
    output.push('\n');
    output.push_str(&format!(
        "{:30} {:>11} {:>11} {:>11} {:>11}\n",
        "TOTALS:",
        overview.total_assigned.to_string(),
        "",
        overview.total_activity.to_string(),
        overview.total_available.to_string()
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetId, BudgetPeriod, Money, SubcategoryBudget, SubcategoryBudgetSummary};

    #[test]
    fn test_overview_marks_overspent() {
        let period = BudgetPeriod::new(2025, 1).unwrap();
        let groceries = SubcategoryId::new();
        let mut envelope = SubcategoryBudget::new(groceries, Money::zero());
        envelope.set_assigned(Money::from_cents(100_00));
        let summary =
            SubcategoryBudgetSummary::from_envelope(period, &envelope, Money::from_cents(150_00));

        let overview = BudgetOverview {
            budget_id: BudgetId::new(),
            period,
            name: period.budget_name(),
            total_assigned: Money::from_cents(100_00),
            total_activity: Money::from_cents(150_00),
            total_available: summary.available,
            envelopes: vec![summary],
        };

        let mut names = HashMap::new();
        names.insert(groceries, "Food/Groceries".to_string());

        let output = format_budget_overview(&overview, &names);
        assert!(output.contains("Food/Groceries"));
        assert!(output.contains("⚠"));
        assert!(output.contains("TOTALS:"));
    }
}
