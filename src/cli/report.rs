//! Report CLI commands

use chrono::NaiveDate;
use clap::{Args, Subcommand};

use crate::display::{format_balance_totals, format_income_vs_spending, format_spending_breakdown};
use crate::error::LedgerResult;
use crate::services::ReportService;
use crate::storage::Storage;

use super::parse_period;

/// Date range shared by the flow reports
#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// Whole month (YYYY-MM or "current"); overrides --from/--to
    #[arg(short, long)]
    pub month: Option<String>,
    /// First day included (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Last day included (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

impl RangeArgs {
    fn resolve(&self) -> LedgerResult<(Option<NaiveDate>, Option<NaiveDate>)> {
        match &self.month {
            Some(month) => {
                let period = parse_period(Some(month.as_str()))?;
                Ok((Some(period.start_date()), Some(period.end_date())))
            }
            None => Ok((self.from, self.to)),
        }
    }
}

/// Report subcommands
#[derive(Subcommand)]
pub enum ReportCommands {
    /// Spending per category
    Spending {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Income against spending
    Income {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Total balance across accounts, debt subtracted
    Balance,
}

/// Handle a report command
pub fn handle_report_command(storage: &Storage, cmd: ReportCommands) -> LedgerResult<()> {
    let service = ReportService::new(storage);

    match cmd {
        ReportCommands::Spending { range } => {
            let (from, to) = range.resolve()?;
            print!("{}", format_spending_breakdown(&service.spending_breakdown(from, to)?));
        }
        ReportCommands::Income { range } => {
            let (from, to) = range.resolve()?;
            print!("{}", format_income_vs_spending(&service.income_vs_spending(from, to)?));
        }
        ReportCommands::Balance => {
            print!("{}", format_balance_totals(&service.total_balance()?));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_overrides_dates() {
        let range = RangeArgs {
            month: Some("2024-02".into()),
            from: NaiveDate::from_ymd_opt(2023, 1, 1),
            to: None,
        };
        let (from, to) = range.resolve().unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(to, NaiveDate::from_ymd_opt(2024, 2, 29));
    }

    #[test]
    fn test_open_range_passes_through() {
        let range = RangeArgs::default();
        assert_eq!(range.resolve().unwrap(), (None, None));
    }
}
