//! Budget period management
//!
//! Budgets are created lazily per month. A new month's envelopes are seeded
//! from the previous month's rolled-over balance:
//!
//! `total_balance(n) = total_balance(n-1) + monthly_assigned(n-1) - activity(n-1)`
//!
//! Activity is always computed from the ledger, never cached, so any change
//! to past transactions or allocations is pushed forward by recomputing the
//! later periods that already exist.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Budget, BudgetId, BudgetPeriod, Money, SubcategoryBudget, SubcategoryBudgetSummary,
    SubcategoryId,
};
use crate::services::spending::{activity_by_subcategory, monthly_activity};
use crate::storage::{LedgerState, Storage};

/// Source of "today" for deciding which periods are in the future
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock (UTC)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock stuck on one date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Balance a subcategory starts `period` with
fn seed_balance(state: &LedgerState, subcategory_id: SubcategoryId, period: BudgetPeriod) -> Money {
    let prev = period.prev();
    state
        .budgets
        .get_by_period(prev)
        .and_then(|budget| budget.envelope(subcategory_id))
        .map(|envelope| {
            envelope.carry_over(monthly_activity(&state.transactions, subcategory_id, prev))
        })
        .unwrap_or_default()
}

/// Re-derive every `total_balance` of an existing budget from its
/// predecessor. Adds envelopes for subcategories created since.
/// Assigned and target amounts are left alone.
pub fn recompute(state: &mut LedgerState, period: BudgetPeriod) {
    let seeds: Vec<(SubcategoryId, Money)> = state
        .categories
        .get_all_subcategories()
        .into_iter()
        .map(|sub| (sub.id, seed_balance(state, sub.id, period)))
        .collect();

    let Some(budget) = state.budgets.get_by_period_mut(period) else {
        return;
    };

    for (subcategory_id, seed) in seeds {
        match budget.envelope_mut(subcategory_id) {
            Some(envelope) => envelope.total_balance = seed,
            None => budget
                .subcategory_budgets
                .push(SubcategoryBudget::new(subcategory_id, seed)),
        }
    }
    budget.updated_at = Utc::now();
}

/// Give an existing budget envelopes for subcategories created after it,
/// seeded from the previous month. Existing envelopes are untouched.
fn add_missing_envelopes(state: &mut LedgerState, period: BudgetPeriod) {
    let Some(budget) = state.budgets.get_by_period(period) else {
        return;
    };
    let missing: Vec<SubcategoryId> = state
        .categories
        .get_all_subcategories()
        .into_iter()
        .map(|sub| sub.id)
        .filter(|id| budget.envelope(*id).is_none())
        .collect();
    if missing.is_empty() {
        return;
    }

    let seeds: Vec<(SubcategoryId, Money)> = missing
        .into_iter()
        .map(|id| (id, seed_balance(state, id, period)))
        .collect();

    if let Some(budget) = state.budgets.get_by_period_mut(period) {
        tracing::debug!(period = %period, added = seeds.len(), "Added envelopes");
        for (subcategory_id, seed) in seeds {
            budget
                .subcategory_budgets
                .push(SubcategoryBudget::new(subcategory_id, seed));
        }
        budget.updated_at = Utc::now();
    }
}

/// Recompute every existing budget after `period`, oldest first
pub fn propagate_forward(state: &mut LedgerState, period: BudgetPeriod) {
    for later in state.budgets.periods_after(period) {
        recompute(state, later);
    }
}

/// Get the budget for `period`, creating and seeding it if needed. Budgets
/// for months after `today` are recomputed on every access; older ones only
/// gain envelopes for new subcategories.
pub fn get_or_create(state: &mut LedgerState, period: BudgetPeriod, today: NaiveDate) -> BudgetId {
    if let Some(budget) = state.budgets.get_by_period(period) {
        let id = budget.id;
        if period > BudgetPeriod::containing(today) {
            recompute(state, period);
        } else {
            add_missing_envelopes(state, period);
        }
        return id;
    }

    let mut budget = Budget::new(period);
    for sub in state.categories.get_all_subcategories() {
        budget
            .subcategory_budgets
            .push(SubcategoryBudget::new(sub.id, seed_balance(state, sub.id, period)));
    }
    let id = budget.id;

    tracing::debug!(
        period = %period,
        envelopes = budget.subcategory_budgets.len(),
        "Created budget"
    );

    state.budgets.upsert(budget);
    propagate_forward(state, period);
    id
}

/// Budget overview for a period
#[derive(Debug, Clone)]
pub struct BudgetOverview {
    pub budget_id: BudgetId,
    pub period: BudgetPeriod,
    pub name: String,
    pub total_assigned: Money,
    pub total_activity: Money,
    pub total_available: Money,
    pub envelopes: Vec<SubcategoryBudgetSummary>,
}

/// Service for budget management
pub struct BudgetService<'a> {
    storage: &'a Storage,
    clock: Arc<dyn Clock>,
}

impl<'a> BudgetService<'a> {
    /// Create a new budget service on the system clock
    pub fn new(storage: &'a Storage) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    pub fn with_clock(storage: &'a Storage, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Get or create the budget for a month
    pub fn get_or_create(&self, period: BudgetPeriod) -> LedgerResult<Budget> {
        let today = self.clock.today();
        self.storage.transact(|state| {
            let id = get_or_create(state, period, today);
            state
                .budgets
                .get(id)
                .cloned()
                .ok_or_else(|| LedgerError::budget_not_found(period.to_string()))
        })
    }

    /// Budget for the month containing today
    pub fn current_budget(&self) -> LedgerResult<Budget> {
        self.get_or_create(BudgetPeriod::containing(self.clock.today()))
    }

    pub fn get_budget(&self, id: BudgetId) -> LedgerResult<Budget> {
        self.storage
            .read(|state| state.budgets.get(id).cloned())?
            .ok_or_else(|| LedgerError::budget_not_found(id.to_string()))
    }

    /// All budgets, oldest first
    pub fn list_budgets(&self) -> LedgerResult<Vec<Budget>> {
        self.storage
            .read(|state| state.budgets.get_all().into_iter().cloned().collect())
    }

    /// Set the amount assigned to an envelope. Later periods are
    /// recomputed in the same unit of work.
    pub fn set_monthly_assigned(
        &self,
        period: BudgetPeriod,
        subcategory_id: SubcategoryId,
        amount: Money,
    ) -> LedgerResult<SubcategoryBudget> {
        self.edit_envelope(period, subcategory_id, |envelope| envelope.set_assigned(amount))
    }

    /// Set an envelope's spending target
    pub fn set_monthly_target(
        &self,
        period: BudgetPeriod,
        subcategory_id: SubcategoryId,
        amount: Money,
    ) -> LedgerResult<SubcategoryBudget> {
        if amount.is_negative() {
            return Err(LedgerError::Validation(
                "Monthly target cannot be negative".into(),
            ));
        }
        self.edit_envelope(period, subcategory_id, |envelope| envelope.set_target(amount))
    }

    fn edit_envelope(
        &self,
        period: BudgetPeriod,
        subcategory_id: SubcategoryId,
        edit: impl FnOnce(&mut SubcategoryBudget),
    ) -> LedgerResult<SubcategoryBudget> {
        let today = self.clock.today();
        self.storage.transact(|state| {
            if state.categories.get_subcategory(subcategory_id).is_none() {
                return Err(LedgerError::subcategory_not_found(subcategory_id.to_string()));
            }

            get_or_create(state, period, today);
            let budget = state
                .budgets
                .get_by_period_mut(period)
                .ok_or_else(|| LedgerError::budget_not_found(period.to_string()))?;
            let envelope = budget
                .envelope_mut(subcategory_id)
                .ok_or_else(|| LedgerError::subcategory_not_found(subcategory_id.to_string()))?;
            edit(envelope);
            let updated = envelope.clone();
            budget.updated_at = Utc::now();

            propagate_forward(state, period);

            tracing::info!(
                period = %period,
                subcategory_id = %subcategory_id,
                assigned = %updated.monthly_assigned,
                target = %updated.monthly_target,
                "Updated envelope"
            );
            Ok(updated)
        })
    }

    /// Per-envelope activity and availability for a month
    pub fn budget_overview(&self, period: BudgetPeriod) -> LedgerResult<BudgetOverview> {
        let budget = self.get_or_create(period)?;
        let activity = self
            .storage
            .read(|state| activity_by_subcategory(&state.transactions, period))?;

        let envelopes: Vec<SubcategoryBudgetSummary> = budget
            .subcategory_budgets
            .iter()
            .map(|envelope| {
                let spent = activity
                    .get(&envelope.subcategory_id)
                    .copied()
                    .unwrap_or_default();
                SubcategoryBudgetSummary::from_envelope(period, envelope, spent)
            })
            .collect();

        Ok(BudgetOverview {
            budget_id: budget.id,
            period,
            name: budget.name.clone(),
            total_assigned: budget.total_assigned(),
            total_activity: envelopes.iter().map(|e| e.activity).sum(),
            total_available: envelopes.iter().map(|e| e.available).sum(),
            envelopes,
        })
    }

    /// Envelopes whose available balance is negative
    pub fn overspent(&self, period: BudgetPeriod) -> LedgerResult<Vec<SubcategoryBudgetSummary>> {
        Ok(self
            .budget_overview(period)?
            .envelopes
            .into_iter()
            .filter(|e| e.is_overspent())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::LedgerPaths;
    use crate::models::{Account, AccountType, Category, Subcategory, Transaction};
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        (temp_dir, storage)
    }

    fn setup_test_data(storage: &Storage) -> (SubcategoryId, Account) {
        let category = Category::new("Needs");
        let groceries = Subcategory::new("Groceries", category.id);
        let sub_id = groceries.id;
        let account = Account::new("acct-1", "item-1", "Checking", AccountType::Checking, "USD");
        let account_clone = account.clone();

        storage
            .transact(|state| {
                state.categories.upsert_category(category);
                state.categories.upsert_subcategory(groceries);
                state.accounts.upsert(account_clone);
                Ok(())
            })
            .unwrap();
        (sub_id, account)
    }

    fn spend(storage: &Storage, account: &Account, sub: SubcategoryId, date: NaiveDate, cents: i64) {
        let mut txn = Transaction::new(
            format!("ext-{}-{}", date, cents),
            account.id,
            date,
            Money::from_cents(cents),
            "Grocer",
        );
        txn.subcategory_id = Some(sub);
        storage
            .transact(|state| {
                state.transactions.upsert(txn);
                Ok(())
            })
            .unwrap();
    }

    fn service(storage: &Storage) -> BudgetService<'_> {
        let today = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
        BudgetService::with_clock(storage, Arc::new(FixedClock(today)))
    }

    fn period(year: i32, month: u32) -> BudgetPeriod {
        BudgetPeriod::new(year, month).unwrap()
    }

    #[test]
    fn test_get_or_create_seeds_envelopes() {
        let (_temp_dir, storage) = create_test_storage();
        let (sub, _) = setup_test_data(&storage);

        let budget = service(&storage).get_or_create(period(2024, 1)).unwrap();
        assert_eq!(budget.name, "Jan 2024");
        assert_eq!(budget.subcategory_budgets.len(), 1);
        let envelope = budget.envelope(sub).unwrap();
        assert_eq!(envelope.total_balance, Money::zero());
        assert_eq!(envelope.monthly_assigned, Money::zero());

        let again = service(&storage).get_or_create(period(2024, 1)).unwrap();
        assert_eq!(again.id, budget.id);
        assert_eq!(storage.read(|s| s.budgets.count()).unwrap(), 1);
    }

    #[test]
    fn test_rollover_recurrence() {
        let (_temp_dir, storage) = create_test_storage();
        let (sub, account) = setup_test_data(&storage);
        let service = service(&storage);

        service.get_or_create(period(2024, 1)).unwrap();
        service
            .set_monthly_assigned(period(2024, 1), sub, Money::from_cents(10_000))
            .unwrap();
        spend(&storage, &account, sub, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), -4000);

        let feb = service.get_or_create(period(2024, 2)).unwrap();
        assert_eq!(feb.envelope(sub).unwrap().total_balance, Money::from_cents(6000));
        assert_eq!(feb.envelope(sub).unwrap().monthly_assigned, Money::zero());
    }

    #[test]
    fn test_edit_propagates_to_later_periods() {
        let (_temp_dir, storage) = create_test_storage();
        let (sub, _) = setup_test_data(&storage);
        let service = service(&storage);

        service.get_or_create(period(2024, 1)).unwrap();
        service.get_or_create(period(2024, 2)).unwrap();
        service.get_or_create(period(2024, 3)).unwrap();

        service
            .set_monthly_assigned(period(2024, 1), sub, Money::from_cents(5000))
            .unwrap();

        let budget = service.get_or_create(period(2024, 3)).unwrap();
        assert_eq!(budget.envelope(sub).unwrap().total_balance, Money::from_cents(5000));
    }

    #[test]
    fn test_future_period_recomputed_on_access() {
        let (_temp_dir, storage) = create_test_storage();
        let (sub, account) = setup_test_data(&storage);
        let service = service(&storage);

        service.get_or_create(period(2024, 1)).unwrap();
        let feb = service.get_or_create(period(2024, 2)).unwrap();
        assert_eq!(feb.envelope(sub).unwrap().total_balance, Money::zero());

        // Written straight to storage, bypassing every budget hook
        spend(&storage, &account, sub, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(), -2500);

        let feb = service.get_or_create(period(2024, 2)).unwrap();
        assert_eq!(feb.envelope(sub).unwrap().total_balance, Money::from_cents(-2500));
    }

    #[test]
    fn test_recompute_adds_new_subcategories_and_keeps_assignments() {
        let (_temp_dir, storage) = create_test_storage();
        let (sub, _) = setup_test_data(&storage);
        let service = service(&storage);

        service
            .set_monthly_assigned(period(2024, 3), sub, Money::from_cents(700))
            .unwrap();

        let category_id = storage
            .read(|s| s.categories.get_subcategory(sub).unwrap().category_id)
            .unwrap();
        let dining = Subcategory::new("Dining", category_id);
        let dining_id = dining.id;
        storage
            .transact(|state| {
                state.categories.upsert_subcategory(dining);
                Ok(())
            })
            .unwrap();

        let march = service.get_or_create(period(2024, 3)).unwrap();
        assert_eq!(march.subcategory_budgets.len(), 2);
        assert!(march.envelope(dining_id).is_some());
        assert_eq!(march.envelope(sub).unwrap().monthly_assigned, Money::from_cents(700));
    }

    #[test]
    fn test_subcategory_added_after_current_budget_exists() {
        let (_temp_dir, storage) = create_test_storage();
        let (groceries, _) = setup_test_data(&storage);
        let service = service(&storage);

        service
            .set_monthly_assigned(period(2024, 1), groceries, Money::from_cents(100_00))
            .unwrap();

        let category_id = storage
            .read(|s| s.categories.get_subcategory(groceries).unwrap().category_id)
            .unwrap();
        let dining = Subcategory::new("Dining", category_id);
        let dining_id = dining.id;
        storage
            .transact(|state| {
                state.categories.upsert_subcategory(dining);
                Ok(())
            })
            .unwrap();

        let envelope = service
            .set_monthly_assigned(period(2024, 1), dining_id, Money::from_cents(50_00))
            .unwrap();
        assert_eq!(envelope.monthly_assigned, Money::from_cents(50_00));
        assert_eq!(envelope.total_balance, Money::zero());

        let overview = service.budget_overview(period(2024, 1)).unwrap();
        assert_eq!(overview.envelopes.len(), 2);
        assert_eq!(overview.total_assigned, Money::from_cents(150_00));
    }

    #[test]
    fn test_target_edits_only_target() {
        let (_temp_dir, storage) = create_test_storage();
        let (sub, _) = setup_test_data(&storage);
        let service = service(&storage);

        service
            .set_monthly_assigned(period(2024, 1), sub, Money::from_cents(1000))
            .unwrap();
        let envelope = service
            .set_monthly_target(period(2024, 1), sub, Money::from_cents(2500))
            .unwrap();

        assert_eq!(envelope.monthly_target, Money::from_cents(2500));
        assert_eq!(envelope.monthly_assigned, Money::from_cents(1000));
        assert_eq!(envelope.total_balance, Money::zero());

        let err = service
            .set_monthly_target(period(2024, 1), sub, Money::from_cents(-1))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_unknown_subcategory_is_not_found() {
        let (_temp_dir, storage) = create_test_storage();
        setup_test_data(&storage);

        let err = service(&storage)
            .set_monthly_assigned(period(2024, 1), SubcategoryId::new(), Money::from_cents(100))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_overview_and_overspent() {
        let (_temp_dir, storage) = create_test_storage();
        let (sub, account) = setup_test_data(&storage);
        let service = service(&storage);

        service
            .set_monthly_assigned(period(2024, 1), sub, Money::from_cents(3000))
            .unwrap();
        service
            .set_monthly_target(period(2024, 1), sub, Money::from_cents(5000))
            .unwrap();
        spend(&storage, &account, sub, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(), -4000);

        let overview = service.budget_overview(period(2024, 1)).unwrap();
        assert_eq!(overview.total_assigned, Money::from_cents(3000));
        assert_eq!(overview.total_activity, Money::from_cents(4000));
        let envelope = &overview.envelopes[0];
        assert_eq!(envelope.available, Money::from_cents(-1000));
        assert_eq!(envelope.target_remaining, Money::from_cents(1000));

        let overspent = service.overspent(period(2024, 1)).unwrap();
        assert_eq!(overspent.len(), 1);
        assert_eq!(overspent[0].subcategory_id, sub);
    }

    #[test]
    fn test_current_budget_and_listing() {
        let (_temp_dir, storage) = create_test_storage();
        setup_test_data(&storage);
        let service = service(&storage);

        let current = service.current_budget().unwrap();
        assert_eq!(current.period, period(2024, 1));
        service.get_or_create(period(2023, 12)).unwrap();

        let budgets = service.list_budgets().unwrap();
        assert_eq!(budgets.len(), 2);
        assert_eq!(budgets[0].period, period(2023, 12));
        assert_eq!(service.get_budget(current.id).unwrap().id, current.id);
        assert!(service.get_budget(BudgetId::new()).unwrap_err().is_not_found());
    }
}
