//! budgetctl
//!
//! Command-line front end for budget transfers over a JSON state file.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use budgetctl_shared::types::{BudgetLineId, BudgetScopeId, TransferId};
use budgetctl_shared::{AppConfig, LogConfig};

mod commands;
mod seed;

#[derive(Parser)]
#[command(
    name = "budgetctl",
    version,
    about = "Move budget allocation between budget control sheets",
    long_about = "budgetctl edits and applies budget transfer batches. Each batch \
                  moves amounts from source budget lines to target budget lines and \
                  can be transferred, reversed or cancelled as a unit."
)]
struct Cli {
    /// Path to the JSON state file
    #[arg(short, long, env = "BUDGETCTL_STATE", default_value = "budgetctl.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print scopes, sheets, lines and transfers
    Show,

    /// Create an empty draft transfer
    Create {
        /// Transfer name
        name: String,
        /// Budget scope ID
        #[arg(long)]
        scope: BudgetScopeId,
    },

    /// Add an item to a draft transfer
    AddItem {
        /// Transfer ID
        transfer: TransferId,
        /// Source budget line ID
        #[arg(long)]
        source_line: BudgetLineId,
        /// Target budget line ID
        #[arg(long)]
        target_line: BudgetLineId,
        /// Amount to move (may be negative)
        #[arg(long, allow_hyphen_values = true)]
        amount: Decimal,
    },

    /// Transfer every item of a batch
    Transfer {
        /// Transfer ID
        id: TransferId,
    },

    /// Reverse every item of a batch
    Reverse {
        /// Transfer ID
        id: TransferId,
    },

    /// Cancel a batch
    Cancel {
        /// Transfer ID
        id: TransferId,
    },

    /// Delete a batch that has not been applied
    Delete {
        /// Transfer ID
        id: TransferId,
    },

    /// Write a demo state file
    Seed {
        /// Overwrite an existing state file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.log);

    let mut out = std::io::stdout().lock();
    match cli.command {
        Commands::Seed { force } => seed::write(&cli.state, force, &mut out),
        Commands::Show => commands::Workspace::open(&cli.state, &config.transfer)?.show(&mut out),
        command => {
            let workspace = commands::Workspace::open(&cli.state, &config.transfer)?;
            let result = match command {
                Commands::Create { name, scope } => workspace.create(&name, scope, &mut out),
                Commands::AddItem {
                    transfer,
                    source_line,
                    target_line,
                    amount,
                } => workspace.add_item(transfer, source_line, target_line, amount, &mut out),
                Commands::Transfer { id } => workspace.transfer(id, &mut out),
                Commands::Reverse { id } => workspace.reverse(id, &mut out),
                Commands::Cancel { id } => workspace.cancel(id, &mut out),
                Commands::Delete { id } => workspace.delete(id, &mut out),
                Commands::Show | Commands::Seed { .. } => Ok(()),
            };
            // Literal mode can leave a failed batch partially applied, so
            // the state is written either way.
            workspace.save(&cli.state)?;
            result
        }
    }
}

fn init_tracing(config: &LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
