//! Error types for the data access layer.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use rackmap_model::ModelError;

/// Result alias for data layer operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors raised by the data access layer.
#[derive(Debug)]
pub enum DataError {
    /// Migration execution failed.
    MigrationFailed {
        /// Underlying migration error.
        source: sqlx::migrate::MigrateError,
    },
    /// A database operation failed.
    QueryFailed {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying SQL error.
        source: sqlx::Error,
    },
    /// A persisted value failed model validation on load.
    InvalidDocument {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying validation error.
        source: ModelError,
    },
}

impl Display for DataError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MigrationFailed { .. } => formatter.write_str("migration failed"),
            Self::QueryFailed { .. } => formatter.write_str("database operation failed"),
            Self::InvalidDocument { .. } => {
                formatter.write_str("persisted value failed validation")
            }
        }
    }
}

impl Error for DataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MigrationFailed { source } => Some(source),
            Self::QueryFailed { source, .. } => Some(source),
            Self::InvalidDocument { source, .. } => Some(source),
        }
    }
}

impl From<sqlx::Error> for DataError {
    fn from(source: sqlx::Error) -> Self {
        Self::QueryFailed {
            operation: "sqlx operation",
            source,
        }
    }
}

impl DataError {
    /// True when the failure was a unique-constraint violation, used to
    /// map duplicate names to conflict responses.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::QueryFailed {
                source: sqlx::Error::Database(db),
                ..
            } => db.is_unique_violation(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_error_display_and_source() {
        let migration = DataError::MigrationFailed {
            source: sqlx::migrate::MigrateError::VersionMissing(1),
        };
        assert_eq!(migration.to_string(), "migration failed");
        assert!(migration.source().is_some());

        let query = DataError::QueryFailed {
            operation: "fetch",
            source: sqlx::Error::RowNotFound,
        };
        assert_eq!(query.to_string(), "database operation failed");
        assert!(query.source().is_some());
        assert!(!query.is_unique_violation());

        let document = DataError::InvalidDocument {
            operation: "load",
            source: ModelError::NotAnObject { field: "data" },
        };
        assert_eq!(document.to_string(), "persisted value failed validation");
        assert!(document.source().is_some());

        let from = DataError::from(sqlx::Error::RowNotFound);
        assert_eq!(from.to_string(), "database operation failed");
    }
}
