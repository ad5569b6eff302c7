//! Migrate command - Apply the database schema

use clap::Args;
use rostersync_db::{run_migrations, DbPool};

use crate::config::RosterSyncConfig;
use crate::error::CliResult;

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {}

/// Execute the migrate command
pub async fn execute(_args: MigrateArgs, config: &RosterSyncConfig) -> CliResult<()> {
    let pool = DbPool::connect_with_max(&config.database_url, config.max_connections).await?;
    run_migrations(&pool).await?;
    pool.close().await;
    println!("Database schema is up to date.");
    Ok(())
}
