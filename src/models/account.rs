//! Account model
//!
//! Accounts mirror the provider's view of a bank account. They are created and
//! updated only by the reconciler; the balance snapshot is whatever the
//! provider last reported.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::AccountId;
use super::money::Money;

/// Type of financial account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[default]
    Checking,
    Savings,
    Credit,
    Loan,
    Investment,
    Other,
}

impl AccountType {
    /// Returns true if a positive balance on this account is money owed
    pub fn is_liability(&self) -> bool {
        matches!(self, Self::Credit | Self::Loan)
    }

    /// Map a provider's `(type, subtype)` pair onto a local account type
    pub fn from_provider(kind: &str, subtype: Option<&str>) -> Self {
        match (kind.to_lowercase().as_str(), subtype.map(str::to_lowercase)) {
            ("credit", _) => Self::Credit,
            ("loan", _) => Self::Loan,
            ("investment", _) | ("brokerage", _) => Self::Investment,
            ("depository", Some(sub)) if sub == "savings" => Self::Savings,
            ("depository", _) => Self::Checking,
            ("checking", _) => Self::Checking,
            ("savings", _) => Self::Savings,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checking => write!(f, "Checking"),
            Self::Savings => write!(f, "Savings"),
            Self::Credit => write!(f, "Credit Card"),
            Self::Loan => write!(f, "Loan"),
            Self::Investment => write!(f, "Investment"),
            Self::Other => write!(f, "Other"),
        }
    }
}

/// The institution (organization) an account is held at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Institution {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Point-in-time balance reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BalanceSnapshot {
    pub current: Money,
    pub available: Option<Money>,
    pub limit: Option<Money>,
    pub as_of: Option<DateTime<Utc>>,
}

/// A bank account synchronized from a provider item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,

    /// Provider-issued account id
    pub external_id: String,

    /// Provider item this account was linked through
    pub item_id: String,

    #[serde(default)]
    pub institution: Institution,

    /// Account name (e.g., "Plaid Checking")
    pub name: String,

    #[serde(default)]
    pub official_name: Option<String>,

    #[serde(rename = "type")]
    pub account_type: AccountType,

    #[serde(default)]
    pub balance: BalanceSnapshot,

    /// ISO currency code
    pub currency: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account linked to a provider item
    pub fn new(
        external_id: impl Into<String>,
        item_id: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
        currency: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            external_id: external_id.into(),
            item_id: item_id.into(),
            institution: Institution::default(),
            name: name.into(),
            official_name: None,
            account_type,
            balance: BalanceSnapshot::default(),
            currency: currency.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the balance snapshot
    pub fn set_balance(&mut self, balance: BalanceSnapshot) {
        self.balance = balance;
        self.updated_at = Utc::now();
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.account_type)
    }
}
