//! Schema command handlers
//!
//! `create-all`, `drop-all` and `reset-all`. The destructive commands ask
//! for confirmation unless `--yes` was given.

use std::io::{self, IsTerminal};

use crate::config::settings::Settings;
use crate::db::{establish_connection, schema};
use crate::error::{AppError, AppResult};

/// Source of yes/no answers for destructive commands
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> AppResult<bool>;
}

/// Prompts on the terminal with `inquire`
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, message: &str) -> AppResult<bool> {
        if !io::stdin().is_terminal() {
            return Err(AppError::validation(
                "yes",
                "refusing to prompt in non-interactive mode; pass --yes to confirm",
            ));
        }

        inquire::Confirm::new(message)
            .with_default(false)
            .prompt()
            .map_err(|e| AppError::Internal {
                source: anyhow::anyhow!("Prompt cancelled: {e}"),
            })
    }
}

/// Handler for the schema commands
pub struct SchemaCommandHandler<C = TerminalConfirm> {
    config: Settings,
    prompt: C,
}

impl SchemaCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self::with_prompt(config, TerminalConfirm)
    }
}

impl<C: Confirm> SchemaCommandHandler<C> {
    pub fn with_prompt(config: Settings, prompt: C) -> Self {
        Self { config, prompt }
    }

    /// Run the schema file
    pub fn create_all(&mut self) -> AppResult<()> {
        let mut connection = establish_connection(&self.config.database)?;
        self.create(&mut connection)
    }

    /// Drop every object in the configured schema
    pub fn drop_all(&mut self, yes: bool) -> AppResult<()> {
        let message = format!(
            "Drop all objects in schema '{}'? This cannot be undone.",
            self.config.database.schema
        );
        if !self.confirmed(yes, &message)? {
            return Ok(());
        }

        let mut connection = establish_connection(&self.config.database)?;
        schema::drop_all(&mut connection, &self.config.database.schema)?;
        println!("Dropped all objects in schema '{}'", self.config.database.schema);
        Ok(())
    }

    /// Drop and recreate everything, asking once
    pub fn reset_all(&mut self, yes: bool) -> AppResult<()> {
        let message = format!(
            "Drop and recreate all objects in schema '{}'? This cannot be undone.",
            self.config.database.schema
        );
        if !self.confirmed(yes, &message)? {
            return Ok(());
        }

        let mut connection = establish_connection(&self.config.database)?;
        schema::drop_all(&mut connection, &self.config.database.schema)?;
        println!("Dropped all objects in schema '{}'", self.config.database.schema);
        self.create(&mut connection)
    }

    fn create(&self, connection: &mut diesel::PgConnection) -> AppResult<()> {
        let path = &self.config.database.schema_file;
        if schema::create_all(connection, path)? {
            println!("Created all objects from {}", path.display());
        } else {
            println!("Nothing to create: {} is empty", path.display());
        }
        Ok(())
    }

    fn confirmed(&mut self, yes: bool, message: &str) -> AppResult<bool> {
        if yes {
            return Ok(true);
        }
        let answer = self.prompt.confirm(message)?;
        if !answer {
            tracing::info!("Destructive command declined");
            println!("Aborted");
        }
        Ok(answer)
    }
}
