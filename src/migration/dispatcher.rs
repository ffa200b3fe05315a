//! Migrate command dispatcher
//!
//! Turns a named command (`upgrade head`, `downgrade -1`, ...) into a call
//! on the injected [`MigrationBackend`] and maps the result to output text
//! and a process exit code.
//!
//! Name and argument validation happen before the backend is touched, so an
//! unknown command or malformed argument never reaches the database.

use std::io::{self, Write};

use clap::Parser;
use clap::error::ErrorKind;
use thiserror::Error;

use super::operation::{Operation, RECOGNIZED_OPERATIONS, is_recognized};
use super::revision::{MigrationTarget, RevisionTarget};
use super::{BackendError, MigrationBackend, Outcome};

/// Exit code for a failed backend call
pub const EXIT_FAILURE: u8 = 1;

/// Exit code for an unknown command or a malformed argument
pub const EXIT_USAGE: u8 = 2;

const HELP_NAMES: &[&str] = &["help", "-h", "--help"];

/// Argument parser for the migrate operations
#[derive(Parser, Debug)]
#[command(
    name = "migrate",
    bin_name = "dbadmin migrate",
    about = "Migrations using revision scripts",
    disable_version_flag = true
)]
struct MigrateInvocation {
    #[command(subcommand)]
    operation: Operation,
}

/// Errors that end a dispatch
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unknown migrate command '{name}'. Available commands: {available}", available = RECOGNIZED_OPERATIONS.join(", "))]
    UnknownCommand { name: String },

    #[error("{message}")]
    InvalidArgument { message: String },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl DispatchError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        DispatchError::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            DispatchError::UnknownCommand { .. } | DispatchError::InvalidArgument { .. } => EXIT_USAGE,
            DispatchError::Backend(_) => EXIT_FAILURE,
        }
    }
}

/// A migrate command as typed by the operator: a name and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    args: Vec<String>,
}

impl Command {
    pub fn new<N, I, S>(name: N, args: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a command from raw words, the first being the name
    pub fn from_words<I, S>(words: I) -> Result<Self, DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut words = words.into_iter().map(Into::into);
        let name = words.next().ok_or_else(|| {
            DispatchError::invalid_argument(format!(
                "Missing migrate command. Available commands: {}",
                RECOGNIZED_OPERATIONS.join(", ")
            ))
        })?;
        Ok(Self {
            name,
            args: words.collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Result of parsing a [`Command`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Operation(Operation),
    /// Help text was requested; no backend call is made
    Help(String),
}

/// Parse a command into a typed operation
///
/// # Errors
/// - `UnknownCommand` if the name is not a recognized operation
/// - `InvalidArgument` if the arguments do not fit the operation
pub fn parse(command: &Command) -> Result<Parsed, DispatchError> {
    let mut argv: Vec<&str> = vec!["migrate"];

    if HELP_NAMES.contains(&command.name()) {
        match command.args().first() {
            Some(topic) if !is_recognized(topic) => {
                return Err(DispatchError::UnknownCommand {
                    name: topic.clone(),
                });
            }
            Some(topic) => argv.push(topic.as_str()),
            None => {}
        }
        argv.push("--help");
    } else if is_recognized(command.name()) {
        argv.push(command.name());
        argv.extend(command.args().iter().map(String::as_str));
    } else {
        return Err(DispatchError::UnknownCommand {
            name: command.name().to_string(),
        });
    }

    match MigrateInvocation::try_parse_from(argv) {
        Ok(invocation) => Ok(Parsed::Operation(normalize(invocation.operation))),
        Err(err)
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) =>
        {
            Ok(Parsed::Help(err.to_string().trim_end().to_string()))
        }
        Err(err) => Err(DispatchError::invalid_argument(err.to_string().trim_end())),
    }
}

/// Apply argument rewrites that depend on more than one option
fn normalize(operation: Operation) -> Operation {
    match operation {
        // Offline downgrades cannot see the applied revision, so the default
        // relative step is anchored at head.
        Operation::Downgrade(mut args)
            if args.sql && args.revision == MigrationTarget::from(RevisionTarget::Relative(-1)) =>
        {
            args.revision = RevisionTarget::HeadRelative(-1).into();
            Operation::Downgrade(args)
        }
        other => other,
    }
}

/// Dispatches migrate commands to a borrowed backend
pub struct Dispatcher<'a, B: MigrationBackend + ?Sized> {
    backend: &'a mut B,
}

impl<'a, B: MigrationBackend + ?Sized> Dispatcher<'a, B> {
    pub fn new(backend: &'a mut B) -> Self {
        Self { backend }
    }

    /// Parse and execute one command
    pub fn dispatch(&mut self, command: &Command) -> Result<Outcome, DispatchError> {
        let operation = match parse(command)? {
            Parsed::Help(text) => return Ok(Outcome::message(text)),
            Parsed::Operation(operation) => operation,
        };

        tracing::info!(operation = operation.name(), args = ?command.args(), "Dispatching migrate command");
        let result = self.call(&operation);
        match &result {
            Ok(_) => tracing::debug!(operation = operation.name(), "Migrate command succeeded"),
            Err(e) => tracing::debug!(operation = operation.name(), error = %e, "Migrate command failed"),
        }
        result.map_err(DispatchError::from)
    }

    /// Execute one command and capture the outcome for reporting
    pub fn run(&mut self, command: &Command) -> ExecutionResult {
        ExecutionResult::from(self.dispatch(command))
    }

    fn call(&mut self, operation: &Operation) -> Result<Outcome, BackendError> {
        match operation {
            Operation::Init => self.backend.init(),
            Operation::Revision(args) => self.backend.revision(args),
            Operation::Merge(args) => self.backend.merge(args),
            Operation::Upgrade(args) => self.backend.upgrade(args),
            Operation::Downgrade(args) => self.backend.downgrade(args),
            Operation::Show(args) => self.backend.show(args),
            Operation::History(args) => self.backend.history(args),
            Operation::Heads(args) => self.backend.heads(args),
            Operation::Branches(args) => self.backend.branches(args),
            Operation::Current(args) => self.backend.current(args),
            Operation::Stamp(args) => self.backend.stamp(args),
        }
    }
}

/// What one dispatch produced: a message on success, an error otherwise
#[derive(Debug)]
pub struct ExecutionResult {
    message: Option<String>,
    error: Option<DispatchError>,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn error(&self) -> Option<&DispatchError> {
        self.error.as_ref()
    }

    pub fn exit_code(&self) -> u8 {
        self.error.as_ref().map_or(0, DispatchError::exit_code)
    }

    /// Print the message, if any, to `out`
    ///
    /// Errors are left to the caller, which reports them with their causes.
    pub fn write_message<O: Write>(&self, out: &mut O) -> io::Result<()> {
        match &self.message {
            Some(message) => writeln!(out, "{}", message),
            None => Ok(()),
        }
    }

    pub fn into_result(self) -> Result<Option<String>, DispatchError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.message),
        }
    }
}

impl From<Result<Outcome, DispatchError>> for ExecutionResult {
    fn from(result: Result<Outcome, DispatchError>) -> Self {
        match result {
            Ok(outcome) => Self {
                message: outcome.into_text(),
                error: None,
            },
            Err(error) => Self {
                message: None,
                error: Some(error),
            },
        }
    }
}
