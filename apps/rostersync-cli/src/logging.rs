//! Diagnostic logging setup using tracing.
//!
//! Diagnostics go to stderr so the run log printed on stdout can be piped
//! or redirected on its own.

use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor `ROSTERSYNC_LOG` is set.
pub const DEFAULT_FILTER: &str = "info,rostersync=debug";

/// Pick the filter directive: `RUST_LOG`, then `ROSTERSYNC_LOG`, then
/// [`DEFAULT_FILTER`].
pub fn filter_directive<F>(reader: F) -> String
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    ["RUST_LOG", "ROSTERSYNC_LOG"]
        .into_iter()
        .find_map(|key| reader(key).ok().filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Initialize the global tracing subscriber.
///
/// Exits the process if the filter directive cannot be parsed.
pub fn init_logging(json: bool) {
    let directive = filter_directive(|key| std::env::var(key));
    let filter = match EnvFilter::try_new(&directive) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("FATAL: Failed to create log filter: {e}");
            std::process::exit(1);
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let result = if json {
        builder.json().flatten_event(true).try_init()
    } else {
        builder.try_init()
    };
    if result.is_ok() {
        tracing::debug!(filter = %directive, json, "Logging initialized");
    }
}
