//! Error types for roster reconciliation.
//!
//! Only collaborator failures are errors here. Row-level problems (unknown
//! user, failed group creation, ...) are reported in the run summary and
//! never abort a run; see [`crate::summary::RowFailure`].

use thiserror::Error;

/// Run-fatal errors raised by collaborators.
#[derive(Debug, Error)]
pub enum EnrolError {
    /// A backing store is unavailable or rejected a query.
    #[error("Store error: {0}")]
    Store(String),

    /// The roster source could not produce the next record.
    #[error("Record source error: {0}")]
    RecordSource(String),

    /// A message catalog could not be loaded.
    #[error("Message catalog error: {0}")]
    Catalog(String),

    /// Caller-supplied input is unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl EnrolError {
    /// Check if this error came from a backing store.
    #[must_use]
    pub fn is_store_error(&self) -> bool {
        matches!(self, EnrolError::Store(_))
    }
}

impl From<csv::Error> for EnrolError {
    fn from(err: csv::Error) -> Self {
        EnrolError::RecordSource(format!("Failed to parse CSV row: {err}"))
    }
}

impl From<toml::de::Error> for EnrolError {
    fn from(err: toml::de::Error) -> Self {
        EnrolError::Catalog(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EnrolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EnrolError::Store("connection reset".to_string());
        assert_eq!(err.to_string(), "Store error: connection reset");
        assert!(err.is_store_error());
        assert!(!EnrolError::InvalidInput("x".to_string()).is_store_error());
    }

    #[test]
    fn test_toml_error_maps_to_catalog() {
        let err: EnrolError = toml::from_str::<toml::Table>("not = [valid")
            .unwrap_err()
            .into();
        assert!(matches!(err, EnrolError::Catalog(_)));
    }
}
