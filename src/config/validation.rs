//! Configuration validation logic
//!
//! Values that only matter to some commands (the database URL, the pg
//! database name) may be left empty here; the commands that need them
//! report the missing value themselves.

use crate::config::error::ConfigError;
use crate::config::settings::{
    DatabaseConfig, FileSettings, LoggerSettings, MigrationsConfig, PgConfig, Settings,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

/// URL schemes accepted by the PostgreSQL backend
const VALID_URL_SCHEMES: &[&str] = &["postgres://", "postgresql://"];

/// Whether `name` is a plain, unquoted PostgreSQL identifier
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl DatabaseConfig {
    /// Validate database configuration
    ///
    /// # Validation Rules
    /// - URL, when set, must use a PostgreSQL scheme
    /// - Schema must be a plain identifier
    /// - Schema file path must not be empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.url.is_empty() && !VALID_URL_SCHEMES.iter().any(|s| self.url.starts_with(s)) {
            return Err(ConfigError::validation(
                "database.url",
                "Invalid database URL format. Expected format: postgres://[user:password@]host[:port]/database",
            ));
        }

        if !is_identifier(&self.schema) {
            return Err(ConfigError::ValidationError {
                field: "database.schema".to_string(),
                message: format!(
                    "Schema '{}' must start with a letter or underscore and contain only letters, digits and underscores.",
                    self.schema
                ),
            });
        }

        if self.schema_file.as_os_str().is_empty() {
            return Err(ConfigError::validation(
                "database.schema_file",
                "Schema file path must not be empty.",
            ));
        }

        Ok(())
    }
}

impl MigrationsConfig {
    /// Validate migration settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.directory.as_os_str().is_empty() {
            return Err(ConfigError::validation(
                "migrations.directory",
                "Migration directory must not be empty.",
            ));
        }
        Ok(())
    }
}

impl PgConfig {
    /// Validate pg tool settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::validation("pg.host", "Host must not be empty."));
        }
        if self.username.trim().is_empty() {
            return Err(ConfigError::validation(
                "pg.username",
                "Username must not be empty.",
            ));
        }
        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        self.file.validate()
    }
}

impl Settings {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.migrations.validate()?;
        self.pg.validate()?;
        self.logger.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_database_config_empty_url_is_allowed() {
        assert!(DatabaseConfig::default().validate().is_ok());
    }

    #[test]
    fn test_database_config_valid_url_schemes() {
        for url in ["postgres://localhost/app", "postgresql://u:p@db:5432/app"] {
            let config = DatabaseConfig {
                url: url.to_string(),
                ..DatabaseConfig::default()
            };
            assert!(config.validate().is_ok(), "{} should be accepted", url);
        }
    }

    #[test]
    fn test_database_config_rejects_other_backends() {
        let config = DatabaseConfig {
            url: "mysql://localhost/app".to_string(),
            ..DatabaseConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("database.url"));
    }

    #[test]
    fn test_database_config_schema_must_be_identifier() {
        for schema in ["", "1abc", "public; DROP TABLE x", "my-schema"] {
            let config = DatabaseConfig {
                schema: schema.to_string(),
                ..DatabaseConfig::default()
            };
            assert!(config.validate().is_err(), "'{}' should be rejected", schema);
        }

        let config = DatabaseConfig {
            schema: "_tenant_01".to_string(),
            ..DatabaseConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_database_config_empty_schema_file() {
        let config = DatabaseConfig {
            schema_file: PathBuf::new(),
            ..DatabaseConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_migrations_config_empty_directory() {
        let config = MigrationsConfig {
            directory: PathBuf::new(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pg_config_requires_host_and_username() {
        let config = PgConfig {
            host: " ".to_string(),
            ..PgConfig::default()
        };
        assert!(config.validate().is_err());

        let config = PgConfig {
            username: String::new(),
            ..PgConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_logger_settings_valid_levels() {
        for level in ["trace", "debug", "info", "warn", "error", "INFO"] {
            let settings = LoggerSettings {
                level: level.to_string(),
                ..LoggerSettings::default()
            };
            assert!(settings.validate().is_ok(), "{} should be valid", level);
        }
    }

    #[test]
    fn test_logger_settings_invalid_level() {
        let settings = LoggerSettings {
            level: "verbose".to_string(),
            ..LoggerSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_logger_settings_file_enabled_empty_path() {
        let mut settings = LoggerSettings::default();
        settings.file.enabled = true;
        settings.file.path = "  ".to_string();
        assert!(settings.validate().is_err());

        settings.file.enabled = false;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_settings_invalid_logger_format() {
        let mut settings = Settings::default();
        settings.logger.file.format = "xml".to_string();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("logger.file.format"));
    }
}
