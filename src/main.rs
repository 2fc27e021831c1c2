use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use envelope_ledger::cli::{
    handle_budget_command, handle_category_command, handle_item_command, handle_notify_command,
    handle_report_command, handle_sync_command, handle_transaction_command,
};
use envelope_ledger::config::{paths::LedgerPaths, settings::Settings};
use envelope_ledger::logging::init_tracing;
use envelope_ledger::services::CategoryService;
use envelope_ledger::storage::Storage;

#[derive(Parser)]
#[command(
    name = "envelope-ledger",
    version,
    about = "Bank-sync ledger with month-over-month envelope budgets",
    long_about = "envelope-ledger keeps a local ledger in step with a bank-aggregation \
                  provider and tracks envelope budgets per subcategory, carrying \
                  balances forward from month to month."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize settings and default categories
    Init,

    /// Show current configuration and paths
    Config,

    /// Linked provider items and their accounts
    #[command(subcommand)]
    Item(envelope_ledger::cli::ItemCommands),

    /// Sync an item (or every item) with the provider
    Sync {
        /// Provider item id; all items when omitted
        item_id: Option<String>,
    },

    /// Process a provider notification (JSON from a file or stdin)
    Notify {
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Envelope budget commands
    #[command(subcommand)]
    Budget(envelope_ledger::cli::BudgetCommands),

    /// Category management commands
    #[command(subcommand)]
    Category(envelope_ledger::cli::CategoryCommands),

    /// Transaction commands
    #[command(subcommand, alias = "txn")]
    Transaction(envelope_ledger::cli::TransactionCommands),

    /// Spending, income and balance reports
    #[command(subcommand)]
    Report(envelope_ledger::cli::ReportCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = LedgerPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    init_tracing(&settings.log_level);

    let storage = Arc::new(Storage::open(paths.clone())?);

    match cli.command {
        Some(Commands::Init) => {
            println!("Initializing envelope-ledger at: {}", paths.base_dir().display());
            settings.save(&paths)?;
            let created = CategoryService::new(&storage).seed_defaults()?;
            println!("Initialization complete!");
            if created > 0 {
                println!("Created {} default categories.", created);
                println!("Run 'envelope-ledger category list' to see them.");
            }
        }
        Some(Commands::Config) => {
            println!("envelope-ledger Configuration");
            println!("=============================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Settings file:  {}", paths.settings_file().display());
            println!("Ledger file:    {}", paths.ledger_file().display());
            println!();
            println!("Settings:");
            println!("  Log level:          {}", settings.log_level);
            println!("  Currency:           {}", settings.currency_code);
            println!("  Request timeout:    {}s", settings.sync.request_timeout_secs);
            println!("  Sync queue:         {}", settings.sync.queue_capacity);
            println!(
                "  Transfer matching:  ±{} days, {} cent(s)",
                settings.transfers.match_window_days, settings.transfers.tolerance_cents
            );
            println!(
                "  Auto-assign at:     {:.0}% confidence",
                settings.classifier.auto_assign_threshold * 100.0
            );
            match &settings.provider.fixture_file {
                Some(fixture) => println!("  Provider:           fixture {}", fixture.display()),
                None => println!(
                    "  Provider:           {}",
                    settings.provider.base_url.as_deref().unwrap_or("(not configured)")
                ),
            }
        }
        Some(Commands::Item(cmd)) => handle_item_command(&storage, &settings, cmd).await?,
        Some(Commands::Sync { item_id }) => handle_sync_command(&storage, &settings, item_id).await?,
        Some(Commands::Notify { file }) => handle_notify_command(&storage, &settings, file).await?,
        Some(Commands::Budget(cmd)) => handle_budget_command(&storage, cmd)?,
        Some(Commands::Category(cmd)) => handle_category_command(&storage, cmd)?,
        Some(Commands::Transaction(cmd)) => handle_transaction_command(&storage, &settings, cmd)?,
        Some(Commands::Report(cmd)) => handle_report_command(&storage, cmd)?,
        None => {
            println!("envelope-ledger - bank-sync ledger and envelope budgets");
            println!();
            println!("Run 'envelope-ledger --help' for usage information.");
        }
    }

    Ok(())
}
