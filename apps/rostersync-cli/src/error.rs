//! CLI error types and exit codes

use rostersync_core::EnrolError;
use rostersync_db::DbError;
use thiserror::Error;

use crate::config::ConfigError;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error
/// - 3: Database unreachable
/// - 4: Validation error or missing entity
/// - 5: Store or query failure during a run
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Reconciliation failed: {0}")]
    Enrol(#[from] EnrolError),

    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::Io(_) => 1,
            CliError::Db(e) if e.is_connection_error() => 3,
            CliError::Db(_) => 5,
            CliError::Enrol(EnrolError::InvalidInput(_)) => 4,
            CliError::Enrol(EnrolError::Store(_)) => 5,
            CliError::Enrol(_) => 1,
            CliError::NotFound(_) | CliError::Validation(_) => 4,
        }
    }

    /// Print the error to stderr with appropriate formatting
    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {}", self);
        } else {
            eprintln!("Error: {}", self);
        }

        if let Some(suggestion) = self.suggestion() {
            if use_color {
                eprintln!("\n\x1b[33mSuggestion:\x1b[0m {}", suggestion);
            } else {
                eprintln!("\nSuggestion: {}", suggestion);
            }
        }
    }

    /// Get a suggested action for this error
    fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::Db(e) if e.is_connection_error() => {
                Some("Check DATABASE_URL and that PostgreSQL is running.")
            }
            CliError::Db(e) if e.is_query_error() => {
                Some("Run 'rostersync migrate' to create or update the schema.")
            }
            CliError::Config(_) => Some("Set the variable in the environment or in a .env file."),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Io(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_config() {
        assert_eq!(CliError::Config("x".to_string()).exit_code(), 1);
    }

    #[test]
    fn test_exit_code_not_found() {
        assert_eq!(CliError::NotFound("course".to_string()).exit_code(), 4);
    }

    #[test]
    fn test_exit_code_enrol_errors() {
        assert_eq!(
            CliError::from(EnrolError::InvalidInput("x".to_string())).exit_code(),
            4
        );
        assert_eq!(CliError::from(EnrolError::Store("x".to_string())).exit_code(), 5);
        assert_eq!(
            CliError::from(EnrolError::RecordSource("x".to_string())).exit_code(),
            1
        );
    }

    #[test]
    fn test_exit_code_db_errors() {
        let unreachable = CliError::from(DbError::ConnectionFailed(sqlx::Error::PoolTimedOut));
        let failed = CliError::from(DbError::QueryFailed(sqlx::Error::RowNotFound));
        assert_eq!(unreachable.exit_code(), 3);
        assert_eq!(failed.exit_code(), 5);
    }
}
