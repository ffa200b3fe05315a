//! Configuration settings structures for dbadmin
//!
//! One struct per TOML section (`database`, `migrations`, `pg`, `logger`).
//! Every field has a default so a partial file, or none at all, still loads.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "dbadmin".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_schema_file() -> PathBuf {
    PathBuf::from("schema.sql")
}

fn default_migrations_directory() -> PathBuf {
    PathBuf::from("migrations")
}

fn default_pg_host() -> String {
    "localhost".to_string()
}

fn default_pg_username() -> String {
    "postgres".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/dbadmin.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Name and version reported in logs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Application version
    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Database Configuration
// ============================================================================

/// Diesel database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    ///
    /// Only commands that talk to the database require it.
    #[serde(default)]
    pub url: String,

    /// Schema dropped and recreated by `drop-all`
    #[serde(default = "default_schema")]
    pub schema: String,

    /// SQL file executed by `create-all`
    #[serde(default = "default_schema_file")]
    pub schema_file: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            schema: default_schema(),
            schema_file: default_schema_file(),
        }
    }
}

// ============================================================================
// Migrations Configuration
// ============================================================================

/// Migration script location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationsConfig {
    /// Directory holding one sub-directory per revision
    #[serde(default = "default_migrations_directory")]
    pub directory: PathBuf,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            directory: default_migrations_directory(),
        }
    }
}

// ============================================================================
// PostgreSQL Tools Configuration
// ============================================================================

/// Settings for the `pg_dump` / `pg_restore` wrappers
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PgConfig {
    /// Server host
    #[serde(default = "default_pg_host")]
    pub host: String,

    /// Role used to connect
    #[serde(default = "default_pg_username")]
    pub username: String,

    /// Password handed to the child process as `PGPASSWORD`
    #[serde(default)]
    pub password: String,

    /// Database to dump or restore into
    #[serde(default)]
    pub db_name: String,

    /// Prefix prepended to the tool names, e.g. `/usr/lib/postgresql/16/bin/`
    #[serde(default)]
    pub bin_dir: String,
}

impl Default for PgConfig {
    fn default() -> Self {
        Self {
            host: default_pg_host(),
            username: default_pg_username(),
            password: String::new(),
            db_name: String::new(),
            bin_dir: String::new(),
        }
    }
}

impl std::fmt::Debug for PgConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("db_name", &self.db_name)
            .field("bin_dir", &self.bin_dir)
            .finish()
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    /// Whether console output is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether to use colored output
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    /// Whether file output is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Path to the log file
    #[serde(default = "default_log_path")]
    pub path: String,

    /// Whether to append to existing file
    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
        }
    }
}

/// Logger configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console output settings
    #[serde(default)]
    pub console: ConsoleSettings,

    /// File output settings
    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Build the runtime logger configuration, checking level and format
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let console_config = self.console.into_console_config();
        let file_config = self.file.into_file_config()?;

        LoggerConfig::new(console_config, file_config, self.level).map_err(|e| {
            ConfigError::ValidationError {
                field: "logger".to_string(),
                message: e.to_string(),
            }
        })
    }
}

impl ConsoleSettings {
    /// Convert ConsoleSettings to ConsoleConfig
    pub fn into_console_config(self) -> ConsoleConfig {
        ConsoleConfig::new(self.enabled, self.colored)
    }
}

impl FileSettings {
    /// Convert FileSettings to FileConfig
    pub fn into_file_config(self) -> Result<FileConfig, ConfigError> {
        let format = self.parse_format()?;

        FileConfig::new(self.enabled, PathBuf::from(self.path), self.append, format).map_err(
            |e| ConfigError::ValidationError {
                field: "logger.file".to_string(),
                message: e.to_string(),
            },
        )
    }

    fn parse_format(&self) -> Result<LogFormat, ConfigError> {
        self.format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: e.to_string(),
            })
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Everything `dbadmin` reads from `config/*.toml` and `DBADMIN_*` variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Application information
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Migration script configuration
    #[serde(default)]
    pub migrations: MigrationsConfig,

    /// PostgreSQL client tool configuration
    #[serde(default)]
    pub pg: PgConfig,

    /// Logger configuration
    #[serde(default)]
    pub logger: LoggerSettings,
}
