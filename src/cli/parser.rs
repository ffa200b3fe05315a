//! CLI argument parsing with clap
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, arguments, and their documentation.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::db::pg_tools::DEFAULT_LOCATION;

/// Database administration including schema migrations
#[derive(Parser, Debug)]
#[command(name = "dbadmin")]
#[command(about = "Database administration including schema migrations")]
#[command(long_about = "
dbadmin manages a PostgreSQL database: it creates and drops the schema,
runs versioned migration scripts and wraps pg_dump / pg_restore.

EXAMPLES:
    # Create the migration script directory and a first revision
    dbadmin migrate init
    dbadmin migrate revision -m \"create users\"

    # Apply every pending migration, then step back one
    dbadmin migrate upgrade
    dbadmin migrate downgrade -1

    # Print the SQL an upgrade would run without touching the database
    dbadmin migrate upgrade head --sql

    # Drop and recreate everything without prompting
    dbadmin reset-all --yes

    # Back up and restore
    dbadmin pg dump -l backup.pg_dump
    dbadmin --env production pg restore -l backup.pg_dump

Run 'dbadmin migrate help' for the list of migrate operations.
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    ///
    /// Load this TOML file instead of the layered files under `config/`.
    /// `DBADMIN_*` environment variables still apply on top of it.
    ///
    /// Example: --config /etc/dbadmin/production.toml
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects which `{environment}.toml` layer is loaded, overriding
    /// `DBADMIN_APP_ENV`.
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create database and objects
    ///
    /// Runs the schema file (`database.schema_file`) in one transaction.
    CreateAll,

    /// Drop all database objects
    ///
    /// Drops `database.schema` with CASCADE and recreates it empty.
    DropAll(ConfirmArgs),

    /// Drop and recreate all objects
    ResetAll(ConfirmArgs),

    /// Migrations using revision scripts
    ///
    /// Everything after `migrate` is handed to the migrate dispatcher, e.g.
    /// `dbadmin migrate upgrade head` or `dbadmin migrate help`.
    #[command(disable_help_flag = true)]
    Migrate(MigrateArgs),

    /// PostgreSQL operations
    #[command(subcommand)]
    Pg(PgCommands),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ConfirmArgs {
    /// Don't ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct MigrateArgs {
    /// Migrate operation followed by its arguments
    #[arg(
        value_name = "OPERATION",
        num_args = 0..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub words: Vec<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum PgCommands {
    /// Run pg_dump
    Dump(LocationArgs),

    /// Run pg_restore
    Restore(LocationArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct LocationArgs {
    /// Backup file location
    #[arg(
        short,
        long,
        value_name = "PATH",
        default_value = DEFAULT_LOCATION,
        value_parser = super::validation::validate_location
    )]
    pub location: PathBuf,
}

/// Environment options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}
