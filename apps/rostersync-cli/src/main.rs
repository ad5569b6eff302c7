//! rostersync - Reconcile course rosters from CSV files
//!
//! - `rostersync import` enrols the listed users and places them in groups
//! - `rostersync migrate` creates or updates the database schema

use clap::{Parser, Subcommand};

use rostersync_cli::commands;
use rostersync_cli::config::RosterSyncConfig;
use rostersync_cli::error::CliResult;
use rostersync_cli::logging::init_logging;

/// rostersync - Course roster reconciliation
#[derive(Parser)]
#[command(name = "rostersync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrol users from a roster file and place them in groups
    Import(commands::import::ImportArgs),

    /// Apply pending database migrations
    Migrate(commands::migrate::MigrateArgs),
}

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = RosterSyncConfig::from_env()?;
    init_logging(config.log_json);

    match cli.command {
        Commands::Import(args) => commands::import::execute(args, &config).await,
        Commands::Migrate(args) => commands::migrate::execute(args, &config).await,
    }
}
