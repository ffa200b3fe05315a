//! Command executor for dispatching CLI commands
//!
//! This module provides the main entry point for executing CLI commands
//! after parsing and configuration loading.

use super::handlers::{MigrateCommandHandler, PgCommandHandler, SchemaCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::settings::Settings;
use crate::error::AppResult;

/// Execute a CLI command with the given settings
///
/// # Errors
/// Returns errors from command handlers; migrate failures carry the
/// dispatcher's exit code through `AppError::Dispatch`
pub fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    match &cli.command {
        Commands::CreateAll => SchemaCommandHandler::new(settings).create_all(),
        Commands::DropAll(args) => SchemaCommandHandler::new(settings).drop_all(args.yes),
        Commands::ResetAll(args) => SchemaCommandHandler::new(settings).reset_all(args.yes),
        Commands::Migrate(args) => MigrateCommandHandler::new(settings).execute(&args.words),
        Commands::Pg(command) => PgCommandHandler::new(settings).execute(command),
    }
}
