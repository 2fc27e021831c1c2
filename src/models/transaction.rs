//! Transaction model
//!
//! Transactions are keyed by the provider's external id, which makes ingest
//! idempotent. A transaction is either directly categorized or split across
//! subcategories, never both.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, MerchantId, SplitId, SubcategoryId, TransactionId};
use super::merchant::Merchant;
use super::money::Money;

/// Provider primary category values that mark a transfer between accounts
pub const TRANSFER_PRIMARY_CATEGORIES: [&str; 2] = ["TRANSFER_IN", "TRANSFER_OUT"];

/// Category metadata as reported by the provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCategory {
    pub primary: Option<String>,
    pub detailed: Option<String>,
    pub confidence: Option<String>,
}

impl ProviderCategory {
    /// Whether the provider classifies this record as a transfer
    pub fn is_transfer(&self) -> bool {
        self.primary
            .as_deref()
            .map(|p| TRANSFER_PRIMARY_CATEGORIES.contains(&p.to_uppercase().as_str()))
            .unwrap_or(false)
    }
}

/// A portion of a transaction assigned to one subcategory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSplit {
    pub id: SplitId,

    pub subcategory_id: SubcategoryId,

    /// Same sign as the parent transaction
    pub amount: Money,

    #[serde(default)]
    pub memo: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl TransactionSplit {
    pub fn new(subcategory_id: SubcategoryId, amount: Money) -> Self {
        Self {
            id: SplitId::new(),
            subcategory_id,
            amount,
            memo: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_memo(
        subcategory_id: SubcategoryId,
        amount: Money,
        memo: Option<String>,
    ) -> Self {
        let mut split = Self::new(subcategory_id, amount);
        split.memo = memo.filter(|m| !m.trim().is_empty());
        split
    }
}

/// A ledger transaction synchronized from a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,

    /// Provider transaction id, the idempotency key for ingest
    pub external_id: String,

    /// The account this transaction belongs to
    pub account_id: AccountId,

    /// Signed amount (positive for inflow, negative for outflow)
    pub amount: Money,

    /// Posted date
    pub date: NaiveDate,

    #[serde(default)]
    pub authorized_date: Option<NaiveDate>,

    #[serde(default)]
    pub transacted_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub pending: bool,

    /// External id of the pending record this one replaced
    #[serde(default)]
    pub pending_transaction_id: Option<String>,

    /// Raw transaction name from the provider
    pub name: String,

    #[serde(default)]
    pub payment_channel: Option<String>,

    #[serde(default)]
    pub provider_category: ProviderCategory,

    /// Direct assignment (None when split or uncategorized)
    #[serde(default)]
    pub subcategory_id: Option<SubcategoryId>,

    #[serde(default)]
    pub predicted_subcategory_id: Option<SubcategoryId>,

    #[serde(default)]
    pub predicted_confidence: Option<f64>,

    #[serde(default)]
    pub is_transfer: bool,

    /// Counterpart account, when the transfer was matched
    #[serde(default)]
    pub transfer_account_id: Option<AccountId>,

    /// Counterpart's external id, resolved by query
    #[serde(default)]
    pub transfer_transaction_id: Option<String>,

    #[serde(default)]
    pub splits: Vec<TransactionSplit>,

    #[serde(default)]
    pub is_split: bool,

    #[serde(default)]
    pub merchant_ids: Vec<MerchantId>,

    #[serde(default)]
    pub memo: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(
        external_id: impl Into<String>,
        account_id: AccountId,
        date: NaiveDate,
        amount: Money,
        name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            external_id: external_id.into(),
            account_id,
            amount,
            date,
            authorized_date: None,
            transacted_at: None,
            pending: false,
            pending_transaction_id: None,
            name: name.into(),
            payment_channel: None,
            provider_category: ProviderCategory::default(),
            subcategory_id: None,
            predicted_subcategory_id: None,
            predicted_confidence: None,
            is_transfer: false,
            transfer_account_id: None,
            transfer_transaction_id: None,
            splits: Vec::new(),
            is_split: false,
            merchant_ids: Vec::new(),
            memo: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when this is a transfer linked to its counterpart
    pub fn is_matched_transfer(&self) -> bool {
        self.is_transfer && self.transfer_transaction_id.is_some()
    }

    /// Assign a single subcategory, dropping any splits
    pub fn set_subcategory(&mut self, subcategory_id: Option<SubcategoryId>) {
        self.splits.clear();
        self.is_split = false;
        self.subcategory_id = subcategory_id;
        self.updated_at = Utc::now();
    }

    /// Replace all splits. An empty list clears them.
    pub fn replace_splits(&mut self, splits: Vec<TransactionSplit>) {
        self.is_split = !splits.is_empty();
        self.splits = splits;
        if self.is_split {
            self.subcategory_id = None;
        }
        self.updated_at = Utc::now();
    }

    /// Link a merchant, ignoring duplicates
    pub fn link_merchant(&mut self, merchant_id: MerchantId) {
        if !self.merchant_ids.contains(&merchant_id) {
            self.merchant_ids.push(merchant_id);
        }
    }

    /// Get the total of all splits
    pub fn splits_total(&self) -> Money {
        self.splits.iter().map(|s| s.amount).sum()
    }

    /// Whether this transaction references `subcategory_id` in any way
    pub fn references_subcategory(&self, subcategory_id: SubcategoryId) -> bool {
        self.subcategory_id == Some(subcategory_id)
            || self.predicted_subcategory_id == Some(subcategory_id)
            || self.splits.iter().any(|s| s.subcategory_id == subcategory_id)
    }

    /// Names of linked merchants with at least medium confidence, joined
    /// with ", ". `None` when no linked merchant qualifies.
    pub fn merchant_display_name<'m>(
        &self,
        lookup: impl Fn(&MerchantId) -> Option<&'m Merchant>,
    ) -> Option<String> {
        let names: Vec<&str> = self
            .merchant_ids
            .iter()
            .filter_map(|id| lookup(id))
            .filter(|m| m.confidence.is_displayable())
            .map(|m| m.name.as_str())
            .collect();

        if names.is_empty() {
            None
        } else {
            Some(names.join(", "))
        }
    }

    /// Validate the transaction
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if self.is_split != !self.splits.is_empty() {
            return Err(TransactionValidationError::SplitFlagMismatch);
        }

        if self.subcategory_id.is_some() && !self.splits.is_empty() {
            return Err(TransactionValidationError::SubcategoryAndSplits);
        }

        if !self.splits.is_empty() {
            let splits_total = self.splits_total();
            if splits_total != self.amount {
                return Err(TransactionValidationError::SplitsMismatch {
                    transaction_amount: self.amount,
                    splits_total,
                });
            }
        }

        if let Some(confidence) = self.predicted_confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(TransactionValidationError::ConfidenceOutOfRange(confidence));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.date.format("%Y-%m-%d"),
            self.name,
            self.amount
        )
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransactionValidationError {
    #[error("Split totals ({splits_total}) do not match transaction amount ({transaction_amount})")]
    SplitsMismatch {
        transaction_amount: Money,
        splits_total: Money,
    },
    #[error("Transaction cannot have both a subcategory and splits")]
    SubcategoryAndSplits,
    #[error("Split flag does not agree with the split list")]
    SplitFlagMismatch,
    #[error("Prediction confidence {0} is outside 0.0..=1.0")]
    ConfidenceOutOfRange(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::merchant::ConfidenceTier;

    fn test_txn(cents: i64) -> Transaction {
        Transaction::new(
            "ext-1",
            AccountId::new(),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            Money::from_cents(cents),
            "Test Store",
        )
    }

    #[test]
    fn test_new_transaction() {
        let txn = test_txn(-5000);
        assert_eq!(txn.external_id, "ext-1");
        assert!(txn.amount.is_negative());
        assert!(!txn.is_split);
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn test_provider_transfer_detection() {
        let mut category = ProviderCategory {
            primary: Some("TRANSFER_OUT".into()),
            ..Default::default()
        };
        assert!(category.is_transfer());

        category.primary = Some("transfer_in".into());
        assert!(category.is_transfer());

        category.primary = Some("FOOD_AND_DRINK".into());
        assert!(!category.is_transfer());
        assert!(!ProviderCategory::default().is_transfer());
    }

    #[test]
    fn test_split_transaction() {
        let mut txn = test_txn(-5000);
        txn.subcategory_id = Some(SubcategoryId::new());

        txn.replace_splits(vec![
            TransactionSplit::new(SubcategoryId::new(), Money::from_cents(-3000)),
            TransactionSplit::new(SubcategoryId::new(), Money::from_cents(-2000)),
        ]);

        assert!(txn.is_split);
        assert!(txn.subcategory_id.is_none());
        assert_eq!(txn.splits_total(), Money::from_cents(-5000));
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn test_empty_split_list_clears_splits() {
        let mut txn = test_txn(-5000);
        txn.replace_splits(vec![TransactionSplit::new(
            SubcategoryId::new(),
            Money::from_cents(-5000),
        )]);
        txn.replace_splits(Vec::new());

        assert!(!txn.is_split);
        assert!(txn.splits.is_empty());
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn test_split_validation_mismatch() {
        let mut txn = test_txn(-4999);
        txn.replace_splits(vec![
            TransactionSplit::new(SubcategoryId::new(), Money::from_cents(-3000)),
            TransactionSplit::new(SubcategoryId::new(), Money::from_cents(-2000)),
        ]);

        assert!(matches!(
            txn.validate(),
            Err(TransactionValidationError::SplitsMismatch { .. })
        ));
    }

    #[test]
    fn test_subcategory_and_splits_validation() {
        let mut txn = test_txn(-1000);
        txn.replace_splits(vec![TransactionSplit::new(
            SubcategoryId::new(),
            Money::from_cents(-1000),
        )]);
        txn.subcategory_id = Some(SubcategoryId::new());

        assert_eq!(
            txn.validate(),
            Err(TransactionValidationError::SubcategoryAndSplits)
        );
    }

    #[test]
    fn test_set_subcategory_drops_splits() {
        let mut txn = test_txn(-1000);
        txn.replace_splits(vec![TransactionSplit::new(
            SubcategoryId::new(),
            Money::from_cents(-1000),
        )]);
        let sub = SubcategoryId::new();
        txn.set_subcategory(Some(sub));

        assert_eq!(txn.subcategory_id, Some(sub));
        assert!(!txn.is_split);
        assert!(txn.references_subcategory(sub));
    }

    #[test]
    fn test_merchant_display_name_skips_low_confidence() {
        let mut good = Merchant::new("Starbucks");
        good.confidence = ConfidenceTier::VeryHigh;
        let mut low = Merchant::new("Maybe Coffee");
        low.confidence = ConfidenceTier::Low;

        let mut txn = test_txn(-500);
        txn.link_merchant(good.id);
        txn.link_merchant(low.id);
        txn.link_merchant(good.id);
        assert_eq!(txn.merchant_ids.len(), 2);

        let merchants = [good.clone(), low.clone()];
        let lookup = |id: &MerchantId| merchants.iter().find(|m| m.id == *id);
        assert_eq!(
            txn.merchant_display_name(lookup),
            Some("Starbucks".to_string())
        );

        let mut only_low = test_txn(-500);
        only_low.link_merchant(low.id);
        assert_eq!(only_low.merchant_display_name(lookup), None);
    }

    #[test]
    fn test_display() {
        let txn = test_txn(-5000);
        assert_eq!(format!("{}", txn), "2025-01-15 Test Store -$50.00");
    }
}
