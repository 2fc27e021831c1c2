//! User settings for envelope-ledger
//!
//! Logging level, sync tuning, transfer matching tolerances, provider
//! connection details and classifier thresholds.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::paths::LedgerPaths;
use crate::error::LedgerError;

/// Sync pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Timeout for each provider request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Capacity of the background sync queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl SyncSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Transfer matching window and amount tolerance
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransferSettings {
    /// Days either side of the posted date to search
    #[serde(default = "default_match_window_days")]
    pub match_window_days: i64,

    /// Largest amount difference (in cents) still considered a match
    #[serde(default = "default_tolerance_cents")]
    pub tolerance_cents: i64,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            match_window_days: default_match_window_days(),
            tolerance_cents: default_tolerance_cents(),
        }
    }
}

/// Provider connection settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Serve syncs from a recorded fixture instead of the network
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixture_file: Option<PathBuf>,
}

/// Classifier intake settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassifierSettings {
    /// Predictions at or above this confidence are applied to uncategorized
    /// transactions
    #[serde(default = "default_auto_assign_threshold")]
    pub auto_assign_threshold: f64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            auto_assign_threshold: default_auto_assign_threshold(),
        }
    }
}

/// User settings for envelope-ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Default tracing filter (overridden by `RUST_LOG`)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// ISO currency code for accounts that report none
    #[serde(default = "default_currency_code")]
    pub currency_code: String,

    #[serde(default)]
    pub sync: SyncSettings,

    #[serde(default)]
    pub transfers: TransferSettings,

    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default)]
    pub classifier: ClassifierSettings,
}

fn default_schema_version() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_currency_code() -> String {
    "USD".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_queue_capacity() -> usize {
    64
}

fn default_match_window_days() -> i64 {
    2
}

fn default_tolerance_cents() -> i64 {
    1
}

fn default_auto_assign_threshold() -> f64 {
    0.9
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            log_level: default_log_level(),
            currency_code: default_currency_code(),
            sync: SyncSettings::default(),
            transfers: TransferSettings::default(),
            provider: ProviderSettings::default(),
            classifier: ClassifierSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &LedgerPaths) -> Result<Self, LedgerError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                LedgerError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                LedgerError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            settings.validate()?;
            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &LedgerPaths) -> Result<(), LedgerError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            LedgerError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents).map_err(|e| {
            LedgerError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.sync.request_timeout_secs == 0 {
            return Err(LedgerError::Config(
                "sync.request_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.sync.queue_capacity == 0 {
            return Err(LedgerError::Config(
                "sync.queue_capacity must be greater than 0".into(),
            ));
        }
        if self.transfers.match_window_days < 0 || self.transfers.tolerance_cents < 0 {
            return Err(LedgerError::Config(
                "transfer window and tolerance cannot be negative".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.classifier.auto_assign_threshold) {
            return Err(LedgerError::Config(
                "classifier.auto_assign_threshold must be between 0 and 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.sync.request_timeout_secs, 30);
        assert_eq!(settings.sync.queue_capacity, 64);
        assert_eq!(settings.transfers.match_window_days, 2);
        assert_eq!(settings.transfers.tolerance_cents, 1);
        assert_eq!(settings.currency_code, "USD");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.transfers.match_window_days = 3;
        settings.provider.base_url = Some("https://sandbox.example.com".into());

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.transfers.match_window_days, 3);
        assert_eq!(
            loaded.provider.base_url.as_deref(),
            Some("https://sandbox.example.com")
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"log_level": "debug"}"#).unwrap();
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.sync.queue_capacity, 64);
        assert!((settings.classifier.auto_assign_threshold - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(
            paths.settings_file(),
            r#"{"sync": {"request_timeout_secs": 0}}"#,
        )
        .unwrap();

        let err = Settings::load_or_create(&paths).unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }
}
