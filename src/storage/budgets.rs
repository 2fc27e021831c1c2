//! Budget table
//!
//! One budget per period; the period index is ordered so predecessors and
//! successors can be walked.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::{Budget, BudgetId, BudgetPeriod, SubcategoryId};

/// Serializable budget data structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetData {
    budgets: Vec<Budget>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "BudgetData", into = "BudgetData")]
pub struct BudgetTable {
    data: HashMap<BudgetId, Budget>,
    /// Index: period -> budget id
    by_period: BTreeMap<BudgetPeriod, BudgetId>,
}

impl From<BudgetData> for BudgetTable {
    fn from(file_data: BudgetData) -> Self {
        let mut table = Self::default();
        for budget in file_data.budgets {
            table.upsert(budget);
        }
        table
    }
}

impl From<BudgetTable> for BudgetData {
    fn from(table: BudgetTable) -> Self {
        let mut budgets: Vec<_> = table.data.into_values().collect();
        budgets.sort_by_key(|b| b.period);
        Self { budgets }
    }
}

impl BudgetTable {
    pub fn get(&self, id: BudgetId) -> Option<&Budget> {
        self.data.get(&id)
    }

    pub fn get_by_period(&self, period: BudgetPeriod) -> Option<&Budget> {
        self.by_period.get(&period).and_then(|id| self.data.get(id))
    }

    pub fn get_by_period_mut(&mut self, period: BudgetPeriod) -> Option<&mut Budget> {
        let id = *self.by_period.get(&period)?;
        self.data.get_mut(&id)
    }

    /// All budgets, oldest period first
    pub fn get_all(&self) -> Vec<&Budget> {
        self.by_period
            .values()
            .filter_map(|id| self.data.get(id))
            .collect()
    }

    /// Periods strictly after `period` that already have a budget, in order
    pub fn periods_after(&self, period: BudgetPeriod) -> Vec<BudgetPeriod> {
        self.by_period
            .range(period.next()..)
            .map(|(p, _)| *p)
            .collect()
    }

    /// Insert or replace a budget. A budget for the same period with a
    /// different id is replaced.
    pub fn upsert(&mut self, budget: Budget) {
        if let Some(existing) = self.by_period.get(&budget.period) {
            if *existing != budget.id {
                self.data.remove(existing);
            }
        }
        self.by_period.insert(budget.period, budget.id);
        self.data.insert(budget.id, budget);
    }

    /// Drop a subcategory's envelope from every budget
    pub fn remove_envelopes(&mut self, subcategory_id: SubcategoryId) {
        for budget in self.data.values_mut() {
            budget
                .subcategory_budgets
                .retain(|sb| sb.subcategory_id != subcategory_id);
        }
    }

    pub fn count(&self) -> usize {
        self.data.len()
    }
}
