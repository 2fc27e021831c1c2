//! Merchant resolution
//!
//! Counterparties on incoming records are deduplicated by the provider's
//! entity id. Counterparties without an entity id reuse an existing
//! entity-less merchant with the same name. Nothing here deletes merchants.

use crate::connector::Counterparty;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Merchant, MerchantId, Transaction};
use crate::storage::{MerchantTable, Storage};

/// Find or create the merchant for a counterparty
pub fn resolve_merchant(
    merchants: &mut MerchantTable,
    counterparty: &Counterparty,
) -> LedgerResult<MerchantId> {
    let existing = match counterparty.entity_id.as_deref() {
        Some(entity_id) => merchants.get_by_entity(entity_id),
        None => merchants.get_anonymous_by_name(&counterparty.name),
    };
    if let Some(merchant) = existing {
        return Ok(merchant.id);
    }

    let mut merchant = Merchant::new(counterparty.name.trim());
    merchant.entity_id = counterparty.entity_id.clone();
    merchant.kind = counterparty.kind.clone();
    merchant.logo_url = counterparty.logo_url.clone();
    merchant.website = counterparty.website.clone();
    merchant.confidence = counterparty.confidence;

    merchant
        .validate()
        .map_err(|e| LedgerError::Reconciliation(format!("Invalid counterparty: {}", e)))?;

    tracing::debug!(
        merchant = %merchant.name,
        entity_id = ?merchant.entity_id,
        confidence = %merchant.confidence,
        "Created merchant"
    );

    let id = merchant.id;
    merchants.upsert(merchant);
    Ok(id)
}

/// Resolve every counterparty on a record and link it to `txn`.
/// Counterparties that cannot become a merchant are skipped; the record
/// itself is still applied.
pub fn link_counterparties(
    merchants: &mut MerchantTable,
    txn: &mut Transaction,
    counterparties: &[Counterparty],
) {
    for counterparty in counterparties {
        match resolve_merchant(merchants, counterparty) {
            Ok(id) => txn.link_merchant(id),
            Err(e) => tracing::warn!(
                external_id = %txn.external_id,
                counterparty = %counterparty.name,
                error = %e,
                "Skipping counterparty"
            ),
        }
    }
}

/// Read access to merchants
pub struct MerchantService<'a> {
    storage: &'a Storage,
}

impl<'a> MerchantService<'a> {
    /// Create a new merchant service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Get a merchant by ID
    pub fn get(&self, id: MerchantId) -> LedgerResult<Option<Merchant>> {
        self.storage.read(|state| state.merchants.get(id).cloned())
    }

    /// Get a merchant by provider entity id
    pub fn get_by_entity(&self, entity_id: &str) -> LedgerResult<Option<Merchant>> {
        self.storage
            .read(|state| state.merchants.get_by_entity(entity_id).cloned())
    }

    /// List all merchants sorted by name
    pub fn list(&self) -> LedgerResult<Vec<Merchant>> {
        self.storage
            .read(|state| state.merchants.get_all().into_iter().cloned().collect())
    }

    /// Display name for a transaction's merchants (medium confidence or better)
    pub fn display_name(&self, txn: &Transaction) -> LedgerResult<Option<String>> {
        self.storage.read(|state| {
            txn.merchant_display_name(|id| state.merchants.get(*id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountId, ConfidenceTier, Money};
    use chrono::NaiveDate;

    fn counterparty(name: &str, entity_id: Option<&str>) -> Counterparty {
        Counterparty {
            name: name.to_string(),
            entity_id: entity_id.map(str::to_string),
            kind: Some("merchant".into()),
            logo_url: None,
            website: Some("starbucks.com".into()),
            confidence: ConfidenceTier::VeryHigh,
        }
    }

    #[test]
    fn test_resolve_reuses_by_entity_id() {
        let mut merchants = MerchantTable::default();

        let first = resolve_merchant(&mut merchants, &counterparty("Starbucks", Some("e1"))).unwrap();
        let again =
            resolve_merchant(&mut merchants, &counterparty("STARBUCKS #123", Some("e1"))).unwrap();

        assert_eq!(first, again);
        assert_eq!(merchants.count(), 1);
        let stored = merchants.get(first).unwrap();
        assert_eq!(stored.website.as_deref(), Some("starbucks.com"));
        assert_eq!(stored.confidence, ConfidenceTier::VeryHigh);
    }

    #[test]
    fn test_resolve_without_entity_id_reuses_by_name() {
        let mut merchants = MerchantTable::default();

        let a = resolve_merchant(&mut merchants, &counterparty("Corner Deli", None)).unwrap();
        let b = resolve_merchant(&mut merchants, &counterparty("corner deli", None)).unwrap();
        let c = resolve_merchant(&mut merchants, &counterparty("Corner Deli", Some("e9"))).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(merchants.count(), 2);
    }

    #[test]
    fn test_link_counterparties_dedupes_per_transaction() {
        let mut merchants = MerchantTable::default();
        let mut txn = Transaction::new(
            "t1",
            AccountId::new(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            Money::from_cents(-500),
            "Coffee",
        );

        link_counterparties(
            &mut merchants,
            &mut txn,
            &[
                counterparty("Starbucks", Some("e1")),
                counterparty("Starbucks", Some("e1")),
                counterparty("Square", Some("e2")),
            ],
        );

        assert_eq!(txn.merchant_ids.len(), 2);
    }

    #[test]
    fn test_blank_counterparty_rejected() {
        let mut merchants = MerchantTable::default();
        let err = resolve_merchant(&mut merchants, &counterparty("   ", None)).unwrap_err();
        assert!(matches!(err, LedgerError::Reconciliation(_)));
    }

    #[test]
    fn test_invalid_counterparty_skipped_when_linking() {
        let mut merchants = MerchantTable::default();
        let mut txn = Transaction::new(
            "t2",
            AccountId::new(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            Money::from_cents(-500),
            "Coffee",
        );

        link_counterparties(
            &mut merchants,
            &mut txn,
            &[
                counterparty("", None),
                counterparty(&"x".repeat(201), Some("e3")),
                counterparty("Square", Some("e2")),
            ],
        );

        assert_eq!(txn.merchant_ids.len(), 1);
        assert_eq!(merchants.count(), 1);
    }
}
