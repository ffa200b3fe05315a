use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::migration::DispatchError;
use crate::migration::dispatcher::{EXIT_FAILURE, EXIT_USAGE};

/// Application-wide error type returned by the CLI handlers
///
/// Each variant renders a one-line summary; the underlying cause, when
/// there is one, is exposed through `source()` so the binary can print the
/// whole chain.
#[derive(Error, Debug)]
pub enum AppError {
    /// Migrate command failure, forwarded verbatim
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Invalid command-line input detected outside of clap
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Database operation error with operation context
    #[error("Database operation failed: {operation}")]
    Database {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// External program that could not be started or exited unsuccessfully
    #[error("Command '{program}' failed: {message}")]
    Command { program: String, message: String },

    /// Filesystem error with the offending path
    #[error("I/O error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn database(operation: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        AppError::Database {
            operation: operation.into(),
            source: source.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this error
    ///
    /// Usage mistakes exit with 2, everything else with 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Dispatch(err) => err.exit_code(),
            AppError::Validation { .. } => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        AppError::Configuration {
            key: "settings".to_string(),
            source: error.into(),
        }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(error: diesel::result::Error) -> Self {
        AppError::database("database operation", error)
    }
}

impl From<diesel::ConnectionError> for AppError {
    fn from(error: diesel::ConnectionError) -> Self {
        AppError::database("connect", error)
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;
