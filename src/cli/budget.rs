//! Budget CLI commands
//!
//! Monthly envelope overview, assignments and targets.

use clap::Subcommand;

use crate::display::format_budget_overview;
use crate::error::LedgerResult;
use crate::services::BudgetService;
use crate::storage::Storage;

use super::{parse_amount, parse_period, resolve_subcategory, subcategory_labels};

/// Budget subcommands
#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Show the envelopes for a month
    Show {
        /// Budget period ("YYYY-MM" or "current")
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Set the amount assigned to an envelope
    Assign {
        /// Subcategory ("Category/Subcategory", name, or ID)
        subcategory: String,
        /// Amount (e.g., "100" or "100.00")
        amount: String,
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Set an envelope's monthly target
    Target {
        /// Subcategory ("Category/Subcategory", name, or ID)
        subcategory: String,
        /// Amount (e.g., "100" or "100.00")
        amount: String,
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Show overspent envelopes
    Overspent {
        #[arg(short, long)]
        period: Option<String>,
    },

    /// List budgets that exist
    List,
}

/// Handle a budget command
pub fn handle_budget_command(storage: &Storage, cmd: BudgetCommands) -> LedgerResult<()> {
    let service = BudgetService::new(storage);

    match cmd {
        BudgetCommands::Show { period } => {
            let period = parse_period(period.as_deref())?;
            let overview = service.budget_overview(period)?;
            let labels = subcategory_labels(storage)?;
            print!("{}", format_budget_overview(&overview, &labels));
        }

        BudgetCommands::Assign {
            subcategory,
            amount,
            period,
        } => {
            let period = parse_period(period.as_deref())?;
            let amount = parse_amount(&amount)?;
            let sub = resolve_subcategory(storage, &subcategory)?;

            let envelope = service.set_monthly_assigned(period, sub.id, amount)?;
            println!(
                "Assigned {} to '{}' for {}",
                envelope.monthly_assigned, sub.name, period
            );
        }

        BudgetCommands::Target {
            subcategory,
            amount,
            period,
        } => {
            let period = parse_period(period.as_deref())?;
            let amount = parse_amount(&amount)?;
            let sub = resolve_subcategory(storage, &subcategory)?;

            let envelope = service.set_monthly_target(period, sub.id, amount)?;
            println!(
                "Target for '{}' in {} set to {}",
                sub.name, period, envelope.monthly_target
            );
        }

        BudgetCommands::Overspent { period } => {
            let period = parse_period(period.as_deref())?;
            let overspent = service.overspent(period)?;

            if overspent.is_empty() {
                println!("No overspent envelopes in {}.", period);
            } else {
                let labels = subcategory_labels(storage)?;
                println!("Overspent envelopes in {}:", period);
                for summary in overspent {
                    let name = labels
                        .get(&summary.subcategory_id)
                        .cloned()
                        .unwrap_or_else(|| summary.subcategory_id.to_string());
                    println!("  {:30} {}", name, summary);
                }
            }
        }

        BudgetCommands::List => {
            let budgets = service.list_budgets()?;
            if budgets.is_empty() {
                println!("No budgets yet. Run 'envelope-ledger budget show' to create one.");
            }
            for budget in budgets {
                println!("  {} {}", budget.period, budget);
            }
        }
    }

    Ok(())
}
