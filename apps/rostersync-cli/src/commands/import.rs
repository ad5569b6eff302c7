//! Import command - Reconcile a roster file against a course

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use rostersync_core::{
    Course, CourseId, CsvDelimiter, CsvRecordSource, CsvSourceConfig, IdentifierField,
    MessageCatalog, ReconcileOptions, ReconciliationEngine, RoleId, RunSummary, Stores,
    TemplateCatalog,
};
use rostersync_db::{DbPool, PgBackend};

use crate::config::RosterSyncConfig;
use crate::error::{CliError, CliResult};

/// Arguments for the import command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Roster file: one `identifier,group` line per user
    pub file: PathBuf,

    /// Course to reconcile
    #[arg(long)]
    pub course: CourseId,

    /// Role given to newly enrolled users
    #[arg(long)]
    pub role: RoleId,

    /// User field the first column is matched against
    #[arg(long, default_value = "username", value_parser = IdentifierField::parse)]
    pub identifier: IdentifierField,

    /// Create groups that do not exist yet
    #[arg(long)]
    pub create_groups: bool,

    /// Create groupings that do not exist yet
    #[arg(long)]
    pub create_groupings: bool,

    /// Field delimiter: ',', ';', 'tab' or 'pipe'
    #[arg(long, default_value = ",", value_parser = CsvDelimiter::parse)]
    pub delimiter: CsvDelimiter,

    /// Treat the first line as data rather than a header
    #[arg(long)]
    pub no_header: bool,

    /// Locale for log messages (overrides ROSTERSYNC_LOCALE)
    #[arg(long)]
    pub locale: Option<String>,

    /// Message catalog file (overrides ROSTERSYNC_MESSAGES)
    #[arg(long)]
    pub messages: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl ImportArgs {
    /// Reconciliation switches, with the locale falling back to `default_locale`.
    pub fn options(&self, default_locale: &str) -> ReconcileOptions {
        ReconcileOptions {
            identifier_field: self.identifier,
            create_groups: self.create_groups,
            create_groupings: self.create_groupings,
            locale: self
                .locale
                .clone()
                .unwrap_or_else(|| default_locale.to_string()),
        }
    }

    pub fn source_config(&self) -> CsvSourceConfig {
        CsvSourceConfig {
            delimiter: self.delimiter,
            has_headers: !self.no_header,
        }
    }
}

/// Execute the import command
pub async fn execute(args: ImportArgs, config: &RosterSyncConfig) -> CliResult<()> {
    let data = load_roster(&args.file)?;
    let catalog = load_catalog(args.messages.as_deref().or(config.messages_path.as_deref()))?;

    let pool = DbPool::connect_with_max(&config.database_url, config.max_connections).await?;
    let backend = Arc::new(PgBackend::new(pool));
    let course = backend
        .find_course(args.course)
        .await?
        .ok_or_else(|| CliError::NotFound(format!("course {}", args.course)))?;

    let engine = ReconciliationEngine::new(Stores::from_backend(backend.clone()), catalog);
    let summary = run_import(
        &engine,
        &data,
        &course,
        args.role,
        &args.source_config(),
        &args.options(&config.locale),
    )
    .await?;
    backend.pool().close().await;

    print!("{}", render_summary(&summary, args.json)?);
    Ok(())
}

/// Read the roster file.
pub fn load_roster(path: &Path) -> CliResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| CliError::Io(format!("cannot read {}: {e}", path.display())))
}

/// Built-in English, merged with the catalog file when one is given.
pub fn load_catalog(path: Option<&Path>) -> CliResult<Arc<dyn MessageCatalog>> {
    let catalog = match path {
        Some(path) => TemplateCatalog::from_path(path)?,
        None => TemplateCatalog::english(),
    };
    tracing::debug!(locales = ?catalog.locales(), "Message catalog loaded");
    Ok(Arc::new(catalog))
}

/// Run the engine over roster bytes.
pub async fn run_import(
    engine: &ReconciliationEngine,
    data: &[u8],
    course: &Course,
    role_id: RoleId,
    source_config: &CsvSourceConfig,
    options: &ReconcileOptions,
) -> CliResult<RunSummary> {
    let mut source = CsvRecordSource::from_bytes(data, source_config);
    let summary = engine.process(&mut source, course, role_id, options).await?;
    Ok(summary)
}

/// The text run log, or the whole summary as pretty JSON.
pub fn render_summary(summary: &RunSummary, json: bool) -> CliResult<String> {
    if json {
        let mut out = serde_json::to_string_pretty(summary)?;
        out.push('\n');
        Ok(out)
    } else {
        Ok(summary.log().to_string())
    }
}
