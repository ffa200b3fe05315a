//! Typed migrate operations
//!
//! A [`Command`](super::Command) is parsed into one of these before the
//! backend is called. Argument shapes and defaults follow the usual
//! migration tool conventions (`upgrade` defaults to `head`, `downgrade` to
//! `-1`, and so on).

use std::path::PathBuf;

use clap::{Args, Subcommand};

use super::revision::{MigrationTarget, RevisionRange, RevisionTarget, validate_revision_id};

/// Names of every recognized migrate operation
pub const RECOGNIZED_OPERATIONS: &[&str] = &[
    "init",
    "revision",
    "merge",
    "upgrade",
    "downgrade",
    "show",
    "history",
    "heads",
    "branches",
    "current",
    "stamp",
];

/// Check an operation name against [`RECOGNIZED_OPERATIONS`]
pub fn is_recognized(name: &str) -> bool {
    RECOGNIZED_OPERATIONS.contains(&name)
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Create a new migration script directory
    Init,

    /// Create a new revision file
    Revision(RevisionArgs),

    /// Merge two revisions together, creating a new migration file
    ///
    /// revisions is a list of one or more revisions, or 'heads' for all heads.
    Merge(MergeArgs),

    /// Upgrade to a later version
    ///
    /// revision is the identifier of the revision to upgrade to.
    Upgrade(UpgradeArgs),

    /// Revert to a previous version
    ///
    /// revision is the identifier of the revision to downgrade to.
    Downgrade(DowngradeArgs),

    /// Show the revision denoted by the given symbol
    Show(ShowArgs),

    /// List changeset scripts in chronological order
    History(HistoryArgs),

    /// Show current available heads in the script directory
    Heads(HeadsArgs),

    /// Show current branch points
    Branches(VerboseArgs),

    /// Display the current revision for each database
    Current(VerboseArgs),

    /// 'stamp' the revision table with the given revision; don't run any migrations
    Stamp(StampArgs),
}

impl Operation {
    /// The command name this operation was parsed from
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Init => "init",
            Operation::Revision(_) => "revision",
            Operation::Merge(_) => "merge",
            Operation::Upgrade(_) => "upgrade",
            Operation::Downgrade(_) => "downgrade",
            Operation::Show(_) => "show",
            Operation::History(_) => "history",
            Operation::Heads(_) => "heads",
            Operation::Branches(_) => "branches",
            Operation::Current(_) => "current",
            Operation::Stamp(_) => "stamp",
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RevisionArgs {
    /// Message string to use with 'revision'
    #[arg(short, long)]
    pub message: Option<String>,

    /// Don't emit SQL to database - print the new script paths instead
    #[arg(long)]
    pub sql: bool,

    /// Revision to base the new revision on; must be the head
    #[arg(long, default_value = "head")]
    pub head: RevisionTarget,

    /// Allow a non-head revision as the "head" to splice onto
    #[arg(long)]
    pub splice: bool,

    /// Write the new revision into this directory instead
    ///
    /// Only the configured migrations directory is read by history, upgrade
    /// and the other operations; move the revision there to apply it.
    #[arg(long, value_name = "PATH")]
    pub version_path: Option<PathBuf>,

    /// Specify a hardcoded revision id instead of generating one
    #[arg(long, value_name = "ID", value_parser = validate_revision_id)]
    pub rev_id: Option<String>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct MergeArgs {
    /// Revisions to merge, or 'heads' for all heads
    #[arg(required = true, num_args = 1..)]
    pub revisions: Vec<RevisionTarget>,

    /// Message string to use with 'revision'
    #[arg(short, long)]
    pub message: Option<String>,

    /// Specify a hardcoded revision id instead of generating one
    #[arg(long, value_name = "ID", value_parser = validate_revision_id)]
    pub rev_id: Option<String>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct UpgradeArgs {
    /// Revision to upgrade to; with --sql, a start:end range is also accepted
    #[arg(default_value = "head", allow_negative_numbers = true)]
    pub revision: MigrationTarget,

    /// Don't emit SQL to database - dump to standard output instead
    #[arg(long)]
    pub sql: bool,

    /// Arbitrary 'tag' name - can be used by custom environment scripts
    #[arg(long)]
    pub tag: Option<String>,

    /// Additional arguments consumed by custom environment scripts
    #[arg(short = 'x', long = "x-arg", value_name = "KEY=VALUE")]
    pub x_arg: Vec<String>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct DowngradeArgs {
    /// Revision to downgrade to; with --sql, a start:end range is also accepted
    #[arg(default_value = "-1", allow_negative_numbers = true)]
    pub revision: MigrationTarget,

    /// Don't emit SQL to database - dump to standard output instead
    #[arg(long)]
    pub sql: bool,

    /// Arbitrary 'tag' name - can be used by custom environment scripts
    #[arg(long)]
    pub tag: Option<String>,

    /// Additional arguments consumed by custom environment scripts
    #[arg(short = 'x', long = "x-arg", value_name = "KEY=VALUE")]
    pub x_arg: Vec<String>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ShowArgs {
    /// Revision to show
    #[arg(default_value = "head", allow_negative_numbers = true)]
    pub revision: RevisionTarget,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct HistoryArgs {
    /// Specify a revision range; format is [start]:[end]
    #[arg(short, long, allow_hyphen_values = true)]
    pub rev_range: Option<RevisionRange>,

    /// Use more verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct HeadsArgs {
    /// Use more verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Treat dependency versions as down revisions
    #[arg(long)]
    pub resolve_dependencies: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct VerboseArgs {
    /// Use more verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct StampArgs {
    /// Revision to stamp the version table with
    #[arg(default_value = "head", allow_negative_numbers = true)]
    pub revision: RevisionTarget,

    /// Don't emit SQL to database - dump to standard output instead
    #[arg(long)]
    pub sql: bool,

    /// Arbitrary 'tag' name - can be used by custom environment scripts
    #[arg(long)]
    pub tag: Option<String>,
}
