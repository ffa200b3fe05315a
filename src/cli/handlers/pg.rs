//! `pg dump` / `pg restore` handler

use crate::cli::parser::PgCommands;
use crate::config::settings::Settings;
use crate::db::pg_tools;
use crate::error::AppResult;

/// Handler for the pg subcommands
pub struct PgCommandHandler {
    config: Settings,
}

impl PgCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    pub fn execute(&self, command: &PgCommands) -> AppResult<()> {
        match command {
            PgCommands::Dump(args) => {
                let command = pg_tools::dump_command(&self.config.pg, &args.location)?;
                pg_tools::run(command)?;
                println!("Dumped {} to {}", self.config.pg.db_name, args.location.display());
            }
            PgCommands::Restore(args) => {
                let command = pg_tools::restore_command(&self.config.pg, &args.location)?;
                pg_tools::run(command)?;
                println!("Restored {} from {}", self.config.pg.db_name, args.location.display());
            }
        }
        Ok(())
    }
}
