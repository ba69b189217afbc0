//! # Design
//!
//! - Centralize application-level errors for bootstrap and serving.
//! - Keep error messages constant while carrying context fields for
//!   debugging.
//! - Preserve source errors without re-logging at call sites.

use std::io;

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Environment configuration was missing.
    #[error("missing environment configuration")]
    MissingEnv {
        /// Name of the missing environment variable.
        name: &'static str,
    },
    /// Environment configuration carried an invalid value.
    #[error("invalid configuration")]
    InvalidConfig {
        /// Field name that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Optional value associated with the failure.
        value: Option<String>,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: anyhow::Error,
    },
    /// Data layer operations failed.
    #[error("data access failed")]
    Data {
        /// Operation identifier.
        operation: &'static str,
        /// Source data-layer error.
        source: rackmap_data::DataError,
    },
    /// Feature registration failed during bootstrap.
    #[error("feature registration failed")]
    Registry {
        /// Source registry error.
        source: rackmap_registry::RegistryError,
    },
    /// API server operations failed.
    #[error("api server operation failed")]
    ApiServer {
        /// Operation identifier.
        operation: &'static str,
        /// Source API server error.
        source: anyhow::Error,
    },
    /// IO operations failed.
    #[error("io operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Source IO error.
        source: io::Error,
    },
}

impl AppError {
    pub(crate) const fn telemetry(operation: &'static str, source: anyhow::Error) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn data(operation: &'static str, source: rackmap_data::DataError) -> Self {
        Self::Data { operation, source }
    }

    pub(crate) const fn api_server(operation: &'static str, source: anyhow::Error) -> Self {
        Self::ApiServer { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_error_helpers_build_variants() {
        let telemetry = AppError::telemetry("init", anyhow::anyhow!("boom"));
        assert!(matches!(telemetry, AppError::Telemetry { .. }));

        let data = AppError::data(
            "migrate",
            rackmap_data::DataError::QueryFailed {
                operation: "ping",
                source: sqlx::Error::RowNotFound,
            },
        );
        assert!(matches!(data, AppError::Data { .. }));
        assert_eq!(data.to_string(), "data access failed");

        let api = AppError::api_server("serve", anyhow::anyhow!("closed"));
        assert!(matches!(api, AppError::ApiServer { .. }));
    }
}
