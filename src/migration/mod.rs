//! Schema migrations
//!
//! This module provides:
//! - The [`MigrationBackend`] interface, one method per migrate operation
//! - The [`Dispatcher`] that turns a named command into a backend call
//! - Revision target parsing and the on-disk script directory
//! - [`DieselBackend`], the PostgreSQL implementation over `diesel_migrations`

pub mod diesel_backend;
pub mod dispatcher;
pub mod operation;
pub mod revision;
pub mod script;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use diesel_backend::DieselBackend;
pub use dispatcher::{Command, DispatchError, Dispatcher, ExecutionResult};
pub use operation::{
    DowngradeArgs, HeadsArgs, HistoryArgs, MergeArgs, Operation, RECOGNIZED_OPERATIONS,
    RevisionArgs, ShowArgs, StampArgs, UpgradeArgs, VerboseArgs,
};
pub use revision::{MigrationTarget, RevisionError, RevisionRange, RevisionTarget};
pub use script::{Revision, ScriptDirectory};

/// Errors reported by a migration backend
///
/// The display text is what the operator sees on the error stream, so each
/// variant renders a complete, self-contained message.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Revision(#[from] RevisionError),

    #[error("Path doesn't exist: {}. Please use the 'init' command to create a new scripts folder.", .path.display())]
    ScriptDirectoryMissing { path: PathBuf },

    #[error("Directory {} already exists and is not empty", .path.display())]
    DirectoryNotEmpty { path: PathBuf },

    #[error("Revision {id} already exists")]
    DuplicateRevision { id: String },

    #[error("Can't connect to database: {message}")]
    Connection { message: String },

    #[error("Migration {version} failed: {message}")]
    Migration { version: String, message: String },

    #[error("Database operation failed: {operation}: {message}")]
    Database { operation: String, message: String },

    #[error("{message}")]
    Unsupported { message: String },

    #[error("I/O error on {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },
}

impl BackendError {
    pub fn io(path: &Path, error: io::Error) -> Self {
        BackendError::Io {
            path: path.to_path_buf(),
            message: error.to_string(),
        }
    }

    pub fn database(operation: impl Into<String>, error: impl std::fmt::Display) -> Self {
        BackendError::Database {
            operation: operation.into(),
            message: error.to_string(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        BackendError::Unsupported {
            message: message.into(),
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Successful result of a backend call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    message: Option<String>,
}

impl Outcome {
    /// A success with nothing to print
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// Join output lines into one message; no lines means no message
    pub fn lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        if lines.is_empty() {
            Self::empty()
        } else {
            Self::message(lines.join("\n"))
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn into_text(self) -> Option<String> {
        self.message
    }
}

/// The migration subsystem the dispatcher forwards to
///
/// Implementations own their connection and script location; the
/// dispatcher only borrows a backend for the duration of one command.
pub trait MigrationBackend {
    fn init(&mut self) -> BackendResult<Outcome>;

    fn revision(&mut self, args: &RevisionArgs) -> BackendResult<Outcome>;

    fn merge(&mut self, args: &MergeArgs) -> BackendResult<Outcome>;

    fn upgrade(&mut self, args: &UpgradeArgs) -> BackendResult<Outcome>;

    fn downgrade(&mut self, args: &DowngradeArgs) -> BackendResult<Outcome>;

    fn show(&mut self, args: &ShowArgs) -> BackendResult<Outcome>;

    fn history(&mut self, args: &HistoryArgs) -> BackendResult<Outcome>;

    fn heads(&mut self, args: &HeadsArgs) -> BackendResult<Outcome>;

    fn branches(&mut self, args: &VerboseArgs) -> BackendResult<Outcome>;

    fn current(&mut self, args: &VerboseArgs) -> BackendResult<Outcome>;

    fn stamp(&mut self, args: &StampArgs) -> BackendResult<Outcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_lines() {
        assert_eq!(Outcome::lines(Vec::<String>::new()), Outcome::empty());
        assert_eq!(Outcome::lines(["a", "b"]).text(), Some("a\nb"));
    }

    #[test]
    fn test_backend_error_messages_are_self_contained() {
        let err = BackendError::Migration {
            version: "20240101000000".to_string(),
            message: "relation \"users\" already exists".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Migration 20240101000000 failed: relation \"users\" already exists"
        );

        let err: BackendError = RevisionError::Unknown { id: "abc".to_string() }.into();
        assert_eq!(err.to_string(), "Can't locate revision identified by 'abc'");
    }
}
