//! Transaction CLI commands
//!
//! Listing synced transactions, splits, categorization, classifier
//! predictions and the unmatched transfer report.

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::{format_transaction_details, format_transaction_register};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{AccountId, Transaction};
use crate::services::{
    MerchantService, SplitRequest, TransactionFilter, TransactionService, TransferService,
};
use crate::storage::Storage;

use super::{parse_amount, resolve_subcategory, subcategory_labels};

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// List transactions, newest first
    List {
        /// Filter by account name or provider account id
        #[arg(short, long)]
        account: Option<String>,
        /// Filter by subcategory
        #[arg(short, long)]
        category: Option<String>,
        /// Only uncategorized transactions
        #[arg(short, long)]
        uncategorized: bool,
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show transaction details
    Show {
        /// Provider transaction id or ID
        transaction: String,
    },

    /// Assign a transaction to one subcategory
    Categorize {
        /// Provider transaction id or ID
        transaction: String,
        /// Subcategory ("Category/Subcategory", name, or ID)
        subcategory: Option<String>,
        /// Remove the assignment instead
        #[arg(long, conflicts_with = "subcategory")]
        clear: bool,
    },

    /// Split a transaction across subcategories
    Split {
        /// Provider transaction id or ID
        transaction: String,
        /// Split part as SUBCATEGORY=AMOUNT; repeat for each part. Amounts
        /// must add up to the transaction amount.
        #[arg(short, long = "part", required = true)]
        parts: Vec<String>,
    },

    /// Remove all splits from a transaction
    Unsplit {
        /// Provider transaction id or ID
        transaction: String,
    },

    /// Record a classifier prediction
    Predict {
        /// Provider transaction id or ID
        transaction: String,
        /// Predicted subcategory
        subcategory: String,
        /// Confidence between 0 and 1
        confidence: f64,
    },

    /// List transfers without a matched counterpart
    Transfers,
}

fn find_transaction(service: &TransactionService<'_>, identifier: &str) -> LedgerResult<Transaction> {
    service
        .find(identifier)?
        .ok_or_else(|| LedgerError::transaction_not_found(identifier))
}

fn find_account(storage: &Storage, identifier: &str) -> LedgerResult<AccountId> {
    storage
        .read(|state| {
            state
                .accounts
                .get_by_external(identifier)
                .or_else(|| {
                    state
                        .accounts
                        .get_all()
                        .into_iter()
                        .find(|a| a.name.eq_ignore_ascii_case(identifier))
                })
                .map(|a| a.id)
        })?
        .ok_or_else(|| LedgerError::account_not_found(identifier))
}

fn parse_split(storage: &Storage, part: &str) -> LedgerResult<SplitRequest> {
    let (subcategory, amount) = part.rsplit_once('=').ok_or_else(|| {
        LedgerError::Validation(format!("Split '{}' must look like SUBCATEGORY=AMOUNT", part))
    })?;

    let sub = resolve_subcategory(storage, subcategory.trim())?;
    Ok(SplitRequest::new(sub.id, parse_amount(amount)?))
}

/// Handle a transaction command
pub fn handle_transaction_command(
    storage: &Storage,
    settings: &Settings,
    cmd: TransactionCommands,
) -> LedgerResult<()> {
    let service = TransactionService::with_classifier(storage, &settings.classifier);

    match cmd {
        TransactionCommands::List {
            account,
            category,
            uncategorized,
            limit,
        } => {
            let mut filter = TransactionFilter::new().limit(limit);
            if let Some(account) = account {
                filter = filter.account(find_account(storage, &account)?);
            }
            if let Some(category) = category {
                filter = filter.subcategory(resolve_subcategory(storage, &category)?.id);
            }
            if uncategorized {
                filter = filter.uncategorized();
            }

            let transactions = service.list(filter)?;
            let labels = subcategory_labels(storage)?;
            print!("{}", format_transaction_register(&transactions, &labels));
        }

        TransactionCommands::Show { transaction } => {
            let txn = find_transaction(&service, &transaction)?;
            let labels = subcategory_labels(storage)?;
            let merchant = MerchantService::new(storage).display_name(&txn)?;
            let counterpart = if txn.is_transfer {
                TransferService::new(storage).get_linked_transaction(txn.id)?
            } else {
                None
            };
            print!(
                "{}",
                format_transaction_details(&txn, &labels, merchant.as_deref(), counterpart.as_ref())
            );
        }

        TransactionCommands::Categorize {
            transaction,
            subcategory,
            clear,
        } => {
            let txn = find_transaction(&service, &transaction)?;
            let target = match (subcategory, clear) {
                (_, true) => None,
                (Some(sub), false) => Some(resolve_subcategory(storage, &sub)?),
                (None, false) => {
                    return Err(LedgerError::Validation(
                        "Name a subcategory or pass --clear".into(),
                    ))
                }
            };

            service.categorize(txn.id, target.as_ref().map(|s| s.id))?;
            match target {
                Some(sub) => println!("Categorized {} as {}", txn.external_id, sub.name),
                None => println!("Cleared category of {}", txn.external_id),
            }
        }

        TransactionCommands::Split { transaction, parts } => {
            let txn = find_transaction(&service, &transaction)?;
            let requests = parts
                .iter()
                .map(|part| parse_split(storage, part))
                .collect::<LedgerResult<Vec<_>>>()?;

            let updated = service.split(txn.id, requests)?;
            println!(
                "Split {} into {} parts ({})",
                updated.external_id,
                updated.splits.len(),
                updated.splits_total()
            );
        }

        TransactionCommands::Unsplit { transaction } => {
            let txn = find_transaction(&service, &transaction)?;
            service.clear_splits(txn.id)?;
            println!("Removed splits from {}", txn.external_id);
        }

        TransactionCommands::Predict {
            transaction,
            subcategory,
            confidence,
        } => {
            let txn = find_transaction(&service, &transaction)?;
            let sub = resolve_subcategory(storage, &subcategory)?;

            let updated = service.apply_prediction(txn.id, sub.id, confidence)?;
            if updated.subcategory_id == Some(sub.id) && txn.subcategory_id != Some(sub.id) {
                println!("Auto-assigned {} to {}", updated.external_id, sub.name);
            } else {
                println!("Recorded prediction {} for {}", sub.name, updated.external_id);
            }
        }

        TransactionCommands::Transfers => {
            let unmatched = TransferService::new(storage).unmatched()?;
            if unmatched.is_empty() {
                println!("All transfers are matched.");
            } else {
                let labels = subcategory_labels(storage)?;
                println!("Unmatched transfers:");
                print!("{}", format_transaction_register(&unmatched, &labels));
            }
        }
    }

    Ok(())
}
