//! Core error types for mindful-core.
//!
//! Timer configuration problems are the only errors the engine itself can
//! raise. Storage and configuration failures come from the host-side
//! persistence layer and are collected under [`CoreError`].

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for mindful-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Timer configuration errors
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while building or reconfiguring a phase timer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// Empty phase sequence, zero-length phase, unnamed phase or zero session length.
    #[error("Invalid timer configuration: {reason}")]
    InvalidConfiguration { reason: String },
}

impl TimerError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        TimerError::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_error_displays_reason() {
        let err = TimerError::invalid("phase sequence is empty");
        assert_eq!(
            err.to_string(),
            "Invalid timer configuration: phase sequence is empty"
        );
    }

    #[test]
    fn timer_error_converts_into_core_error() {
        let err: CoreError = TimerError::invalid("zero").into();
        assert!(matches!(err, CoreError::Timer(_)));
    }

    #[test]
    fn config_and_database_errors_convert_into_core_error() {
        let err: CoreError = ConfigError::UnknownKey("focus.nope".into()).into();
        assert!(matches!(err, CoreError::Config(ConfigError::UnknownKey(_))));

        let err: CoreError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, CoreError::Database(DatabaseError::QueryFailed(_))));
    }
}
