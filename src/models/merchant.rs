//! Merchant model
//!
//! Merchants are counterparties deduplicated by the provider's entity id.
//! They are shared across transactions and never deleted by sync.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::MerchantId;

/// How sure the provider is about a counterparty match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceTier {
    VeryHigh,
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl ConfidenceTier {
    /// Parse a provider confidence string ("VERY_HIGH", "high", ...)
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "VERY_HIGH" => Self::VeryHigh,
            "HIGH" => Self::High,
            "MEDIUM" => Self::Medium,
            "LOW" => Self::Low,
            _ => Self::Unknown,
        }
    }

    /// Whether merchants at this tier are shown in display names
    pub fn is_displayable(&self) -> bool {
        matches!(self, Self::VeryHigh | Self::High | Self::Medium)
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VeryHigh => write!(f, "very high"),
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A counterparty shared by many transactions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Merchant {
    /// Unique identifier
    pub id: MerchantId,

    /// Provider entity id, unique when present
    #[serde(default)]
    pub entity_id: Option<String>,

    pub name: String,

    /// Counterparty kind ("merchant", "marketplace", ...)
    #[serde(default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub logo_url: Option<String>,

    #[serde(default)]
    pub website: Option<String>,

    #[serde(default)]
    pub confidence: ConfidenceTier,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Merchant {
    /// Create a new merchant
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: MerchantId::new(),
            entity_id: None,
            name: name.into(),
            kind: None,
            logo_url: None,
            website: None,
            confidence: ConfidenceTier::Unknown,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate the merchant
    pub fn validate(&self) -> Result<(), MerchantValidationError> {
        if self.name.trim().is_empty() {
            return Err(MerchantValidationError::EmptyName);
        }

        if self.name.len() > 200 {
            return Err(MerchantValidationError::NameTooLong(self.name.len()));
        }

        Ok(())
    }
}

impl fmt::Display for Merchant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validation errors for merchants
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MerchantValidationError {
    #[error("Merchant name cannot be empty")]
    EmptyName,
    #[error("Merchant name too long ({0} chars, max 200)")]
    NameTooLong(usize),
}
