//! Errors raised while loading or validating settings

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested file (`--config`, `DBADMIN_CONFIG_FILE`) is missing
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML or environment values that do not fit `Settings`
    #[error("invalid configuration: {0}")]
    ParseError(String),

    /// A setting failed its section's checks
    #[error("{field}: {message}")]
    ValidationError { field: String, message: String },

    /// `DBADMIN_APP_ENV` (or another control variable) holds an unusable value
    #[error("environment variable error: {0}")]
    EnvVarError(String),

    /// `DBADMIN_CONFIG_DIR` and `DBADMIN_CONFIG_FILE` are both set
    #[error("{0}")]
    MutualExclusivityError(String),

    #[error(transparent)]
    Other(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        ConfigError::FileNotFound(path.into())
    }

    pub fn mutual_exclusivity(message: impl Into<String>) -> Self {
        ConfigError::MutualExclusivityError(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_the_field() {
        let err = ConfigError::validation("pg.host", "Host must not be empty.".to_string());
        assert_eq!(err.to_string(), "pg.host: Host must not be empty.");
    }
}
