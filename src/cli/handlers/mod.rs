//! Command handlers for CLI operations
//!
//! This module contains handlers for different CLI commands,
//! separating command execution logic from parsing and validation.

pub mod migrate;
pub mod pg;
pub mod schema;

pub use migrate::MigrateCommandHandler;
pub use pg::PgCommandHandler;
pub use schema::{Confirm, SchemaCommandHandler, TerminalConfirm};
