//! Budget models
//!
//! One `Budget` exists per calendar month. It owns a `SubcategoryBudget`
//! envelope per subcategory, carrying the assigned amount, the target, and
//! the balance rolled over from the previous month.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BudgetId, SubcategoryBudgetId, SubcategoryId};
use super::money::Money;
use super::period::BudgetPeriod;

/// An envelope for one subcategory in one month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubcategoryBudget {
    pub id: SubcategoryBudgetId,

    pub subcategory_id: SubcategoryId,

    /// Amount assigned to this envelope this month
    pub monthly_assigned: Money,

    /// Spending target for this month
    pub monthly_target: Money,

    /// Balance rolled over from the previous month
    pub total_balance: Money,

    pub updated_at: DateTime<Utc>,
}

impl SubcategoryBudget {
    /// Create an empty envelope seeded with a rolled-over balance
    pub fn new(subcategory_id: SubcategoryId, total_balance: Money) -> Self {
        Self {
            id: SubcategoryBudgetId::new(),
            subcategory_id,
            monthly_assigned: Money::zero(),
            monthly_target: Money::zero(),
            total_balance,
            updated_at: Utc::now(),
        }
    }

    /// Balance carried into the next month given this month's activity
    pub fn carry_over(&self, activity: Money) -> Money {
        self.total_balance + self.monthly_assigned - activity
    }

    pub fn set_assigned(&mut self, amount: Money) {
        self.monthly_assigned = amount;
        self.updated_at = Utc::now();
    }

    pub fn set_target(&mut self, amount: Money) {
        self.monthly_target = amount;
        self.updated_at = Utc::now();
    }
}

/// A monthly budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    /// Unique identifier
    pub id: BudgetId,

    /// The month this budget covers
    pub period: BudgetPeriod,

    /// Display name ("Jan 2024")
    pub name: String,

    /// One envelope per subcategory
    #[serde(default)]
    pub subcategory_budgets: Vec<SubcategoryBudget>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Create an empty budget for a period
    pub fn new(period: BudgetPeriod) -> Self {
        let now = Utc::now();
        Self {
            id: BudgetId::new(),
            period,
            name: period.budget_name(),
            subcategory_budgets: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Find the envelope for a subcategory
    pub fn envelope(&self, subcategory_id: SubcategoryId) -> Option<&SubcategoryBudget> {
        self.subcategory_budgets
            .iter()
            .find(|sb| sb.subcategory_id == subcategory_id)
    }

    /// Find the envelope for a subcategory, mutably
    pub fn envelope_mut(&mut self, subcategory_id: SubcategoryId) -> Option<&mut SubcategoryBudget> {
        self.subcategory_budgets
            .iter_mut()
            .find(|sb| sb.subcategory_id == subcategory_id)
    }

    /// Total assigned across all envelopes
    pub fn total_assigned(&self) -> Money {
        self.subcategory_budgets
            .iter()
            .map(|sb| sb.monthly_assigned)
            .sum()
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} envelopes)", self.name, self.subcategory_budgets.len())
    }
}

/// A summary of an envelope's status for a month
#[derive(Debug, Clone)]
pub struct SubcategoryBudgetSummary {
    pub subcategory_id: SubcategoryId,

    pub period: BudgetPeriod,

    pub monthly_assigned: Money,

    pub monthly_target: Money,

    /// Balance rolled over from the previous month
    pub total_balance: Money,

    /// Spending this month (absolute)
    pub activity: Money,

    /// Available = total_balance + monthly_assigned - activity
    pub available: Money,

    /// Target remaining = monthly_target - activity
    pub target_remaining: Money,
}

impl SubcategoryBudgetSummary {
    /// Create a summary from an envelope and its activity
    pub fn from_envelope(period: BudgetPeriod, envelope: &SubcategoryBudget, activity: Money) -> Self {
        Self {
            subcategory_id: envelope.subcategory_id,
            period,
            monthly_assigned: envelope.monthly_assigned,
            monthly_target: envelope.monthly_target,
            total_balance: envelope.total_balance,
            activity,
            available: envelope.carry_over(activity),
            target_remaining: envelope.monthly_target - activity,
        }
    }

    /// Check if this envelope is overspent (available is negative)
    pub fn is_overspent(&self) -> bool {
        self.available.is_negative()
    }
}

impl fmt::Display for SubcategoryBudgetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Assigned: {} | Activity: {} | Available: {}",
            self.monthly_assigned, self.activity, self.available
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_period() -> BudgetPeriod {
        BudgetPeriod::new(2024, 1).unwrap()
    }

    #[test]
    fn test_new_budget() {
        let budget = Budget::new(test_period());
        assert_eq!(budget.name, "Jan 2024");
        assert!(budget.subcategory_budgets.is_empty());
    }

    #[test]
    fn test_carry_over() {
        let mut envelope = SubcategoryBudget::new(SubcategoryId::new(), Money::zero());
        envelope.set_assigned(Money::from_cents(10_000));

        assert_eq!(envelope.carry_over(Money::from_cents(4_000)).cents(), 6_000);
    }

    #[test]
    fn test_envelope_lookup() {
        let sub = SubcategoryId::new();
        let mut budget = Budget::new(test_period());
        budget
            .subcategory_budgets
            .push(SubcategoryBudget::new(sub, Money::from_cents(500)));

        budget
            .envelope_mut(sub)
            .unwrap()
            .set_assigned(Money::from_cents(2_500));
        assert_eq!(budget.envelope(sub).unwrap().monthly_assigned.cents(), 2_500);
        assert_eq!(budget.total_assigned().cents(), 2_500);
        assert!(budget.envelope(SubcategoryId::new()).is_none());
    }

    #[test]
    fn test_summary() {
        let mut envelope = SubcategoryBudget::new(SubcategoryId::new(), Money::from_cents(1_000));
        envelope.set_assigned(Money::from_cents(50_000));
        envelope.set_target(Money::from_cents(40_000));

        let summary = SubcategoryBudgetSummary::from_envelope(
            test_period(),
            &envelope,
            Money::from_cents(30_000),
        );

        assert_eq!(summary.available.cents(), 21_000);
        assert_eq!(summary.target_remaining.cents(), 10_000);
        assert!(!summary.is_overspent());
    }

    #[test]
    fn test_overspent_summary() {
        let mut envelope = SubcategoryBudget::new(SubcategoryId::new(), Money::zero());
        envelope.set_assigned(Money::from_cents(50_000));

        let summary = SubcategoryBudgetSummary::from_envelope(
            test_period(),
            &envelope,
            Money::from_cents(60_000),
        );

        assert!(summary.is_overspent());
        assert_eq!(summary.available.cents(), -10_000);
    }
}
