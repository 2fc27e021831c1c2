//! CLI command handlers
//!
//! Bridges clap argument parsing with the service layer.

pub mod budget;
pub mod category;
pub mod item;
pub mod notify;
pub mod report;
pub mod transaction;

pub use budget::{handle_budget_command, BudgetCommands};
pub use category::{handle_category_command, CategoryCommands};
pub use item::{handle_item_command, handle_sync_command, ItemCommands};
pub use notify::handle_notify_command;
pub use report::{handle_report_command, ReportCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::settings::Settings;
use crate::connector::{Connector, HttpConnector, HttpConnectorConfig, ScriptedConnector};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{BudgetPeriod, Money, Subcategory, SubcategoryId};
use crate::services::budget::{Clock, SystemClock};
use crate::services::CategoryService;
use crate::storage::Storage;

/// Build the connector selected by the provider settings
///
/// A configured fixture file wins over the HTTP provider.
pub fn build_connector(settings: &Settings) -> LedgerResult<Arc<dyn Connector>> {
    let provider = &settings.provider;

    if let Some(fixture) = &provider.fixture_file {
        tracing::debug!(fixture = %fixture.display(), "Using scripted connector");
        return Ok(Arc::new(ScriptedConnector::from_file(fixture)?));
    }

    let missing = |field: &str| {
        LedgerError::Config(format!(
            "provider.{} is not set (or set provider.fixture_file)",
            field
        ))
    };
    let config = HttpConnectorConfig {
        base_url: provider.base_url.clone().ok_or_else(|| missing("base_url"))?,
        client_id: provider.client_id.clone().ok_or_else(|| missing("client_id"))?,
        secret: provider.secret.clone().ok_or_else(|| missing("secret"))?,
        timeout: settings.sync.request_timeout(),
    };
    Ok(Arc::new(HttpConnector::new(config)?))
}

/// Parse a "YYYY-MM" period, defaulting to the current month
pub fn parse_period(period: Option<&str>) -> LedgerResult<BudgetPeriod> {
    match period {
        None | Some("current") => Ok(BudgetPeriod::containing(SystemClock.today())),
        Some(s) => BudgetPeriod::parse(s)
            .map_err(|e| LedgerError::Validation(format!("Invalid period: {}", e))),
    }
}

pub fn parse_amount(amount: &str) -> LedgerResult<Money> {
    Money::parse(amount).map_err(|e| LedgerError::Validation(format!("Invalid amount: {}", e)))
}

/// Resolve a subcategory by id, "Category/Subcategory", or unique name
pub fn resolve_subcategory(storage: &Storage, identifier: &str) -> LedgerResult<Subcategory> {
    CategoryService::new(storage)
        .find_subcategory(identifier)?
        .ok_or_else(|| LedgerError::subcategory_not_found(identifier))
}

/// "Category/Subcategory" labels for every subcategory
pub fn subcategory_labels(storage: &Storage) -> LedgerResult<HashMap<SubcategoryId, String>> {
    let categories = CategoryService::new(storage).list()?;
    Ok(categories
        .iter()
        .flat_map(|cws| {
            cws.subcategories
                .iter()
                .map(move |sub| (sub.id, format!("{}/{}", cws.category.name, sub.name)))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_period() {
        let period = parse_period(Some("2025-03")).unwrap();
        assert_eq!(period, BudgetPeriod::new(2025, 3).unwrap());
        assert!(parse_period(Some("March")).unwrap_err().is_validation());
        assert!(parse_period(None).is_ok());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("42.50").unwrap(), Money::from_cents(42_50));
        assert!(parse_amount("abc").unwrap_err().is_validation());
    }

    #[test]
    fn test_http_connector_needs_credentials() {
        let settings = Settings::default();
        let err = build_connector(&settings).err().unwrap();
        assert!(matches!(err, LedgerError::Config(_)));
    }

    #[test]
    fn test_missing_fixture_file() {
        let mut settings = Settings::default();
        settings.provider.fixture_file = Some(PathBuf::from("/nonexistent/fixture.json"));
        assert!(build_connector(&settings).is_err());
    }
}
