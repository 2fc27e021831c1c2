//! envelope-ledger - bank-sync ledger and envelope budget engine
//!
//! Keeps a local ledger in step with a bank-aggregation provider through
//! cursor-based delta syncs, and derives month-over-month envelope budgets
//! from the synchronized transactions.
//!
//! # Architecture
//!
//! - `config`: Paths and user settings
//! - `connector`: Provider transport (HTTP and scripted)
//! - `error`: Error types
//! - `models`: Core data models (items, accounts, transactions, budgets, ...)
//! - `storage`: JSON ledger with all-or-nothing, file-locked units of work
//! - `services`: Reconciliation, transfers, budgets, reports and the other business rules
//! - `sync`: Per-item locks and the background sync worker
//! - `cli` / `display`: Command handlers and terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use envelope_ledger::config::{LedgerPaths, Settings};
//! use envelope_ledger::services::LedgerReconciler;
//! use envelope_ledger::storage::Storage;
//!
//! let paths = LedgerPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Arc::new(Storage::open(paths)?);
//! let connector = envelope_ledger::cli::build_connector(&settings)?;
//! let summary = LedgerReconciler::new(storage, connector, &settings)
//!     .sync_item("item-1")
//!     .await?;
//! ```

pub mod cli;
pub mod config;
pub mod connector;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;
pub mod sync;

pub use error::{LedgerError, LedgerResult};
