/// Error types for the climate query service.
///
/// Startup failures (`ConfigError`, `DbConfigError`) stop the process before
/// it serves anything. `StoreError` is the per-request failure and maps to
/// HTTP 500. Queries that match no rows are not errors.

use thiserror::Error;

/// Invalid or unreadable service configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failure reading from the data store while serving a request.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("PostgreSQL query failed: {0}")]
    Postgres(#[from] postgres::Error),

    #[error("SQLite query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Data source unavailable: {0}")]
    Unavailable(String),

    #[error("Stored date '{value}' is not a YYYY-MM-DD date")]
    InvalidDate { value: String },
}

impl StoreError {
    pub fn invalid_date<S: Into<String>>(value: S) -> Self {
        Self::InvalidDate { value: value.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_date_message_names_value() {
        let err = StoreError::invalid_date("08/23/2017");
        assert!(err.to_string().contains("08/23/2017"));
    }

    #[test]
    fn test_sqlite_error_conversion() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Sqlite(_)));
    }
}
