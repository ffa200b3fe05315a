//! PostgreSQL migration backend
//!
//! Implements [`MigrationBackend`] with `diesel_migrations`: scripts are read
//! from a [`ScriptDirectory`] and applied versions are tracked in diesel's
//! `__diesel_schema_migrations` table. History is linear, so branch and
//! merge operations only report on the single head.
//!
//! The connection is opened on first use. Listing commands and `--sql`
//! (offline) runs never connect.

use std::collections::{HashMap, HashSet};

use diesel::migration::{Migration, MigrationConnection, MigrationName, MigrationSource};
use diesel::pg::{Pg, PgConnection};
use diesel::sql_types::Text;
use diesel::{Connection, RunQueryDsl};
use diesel_migrations::{FileBasedMigrations, MigrationHarness};

use super::revision::{MigrationTarget, RevisionTarget};
use super::script::{Revision, ScriptDirectory, timestamp_revision_id};
use super::{
    BackendError, BackendResult, DowngradeArgs, HeadsArgs, HistoryArgs, MergeArgs,
    MigrationBackend, Outcome, RevisionArgs, ShowArgs, StampArgs, UpgradeArgs, VerboseArgs,
};
use crate::config::settings::Settings;

/// Table diesel records applied versions in
pub const VERSION_TABLE: &str = "__diesel_schema_migrations";

/// Migration backend over a PostgreSQL database
pub struct DieselBackend {
    scripts: ScriptDirectory,
    database_url: String,
    connection: Option<PgConnection>,
}

impl DieselBackend {
    pub fn new(scripts: ScriptDirectory, database_url: impl Into<String>) -> Self {
        Self {
            scripts,
            database_url: database_url.into(),
            connection: None,
        }
    }

    /// Build a backend from the `migrations` and `database` settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            ScriptDirectory::new(&settings.migrations.directory),
            settings.database.url.clone(),
        )
    }

    pub fn scripts(&self) -> &ScriptDirectory {
        &self.scripts
    }

    fn connection(&mut self) -> BackendResult<&mut PgConnection> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => establish(&self.database_url)?,
        };
        Ok(self.connection.insert(connection))
    }

    fn applied_versions(&mut self) -> BackendResult<HashSet<String>> {
        let connection = self.connection()?;
        let applied = connection
            .applied_migrations()
            .map_err(|e| BackendError::database("read applied migrations", e))?;
        Ok(applied.into_iter().map(|version| version.to_string()).collect())
    }

    /// Applied versions and the current position, or nothing when offline
    fn current_position(&mut self, revisions: &[Revision]) -> BackendResult<(HashSet<String>, usize)> {
        let applied = self.applied_versions()?;
        let known: HashSet<String> = revisions.iter().map(Revision::version).collect();
        let unknown: Vec<&String> = applied.iter().filter(|v| !known.contains(*v)).collect();
        if !unknown.is_empty() {
            tracing::warn!(versions = ?unknown, "Database has applied versions missing from the script directory");
        }
        let position = revisions
            .iter()
            .rposition(|r| applied.contains(&r.version()))
            .map_or(0, |index| index + 1);
        Ok((applied, position))
    }

    fn loaded_migrations(&self) -> BackendResult<HashMap<String, Box<dyn Migration<Pg>>>> {
        let source = FileBasedMigrations::from_path(self.scripts.root())
            .map_err(|e| BackendError::database("load migration scripts", e))?;
        let migrations = MigrationSource::<Pg>::migrations(&source)
            .map_err(|e| BackendError::database("load migration scripts", e))?;

        let mut by_version = HashMap::with_capacity(migrations.len());
        for migration in migrations {
            let version = migration.name().version().to_string();
            by_version.insert(version, migration);
        }
        Ok(by_version)
    }

    /// Resolve a target, connecting only when it depends on applied state
    fn resolve(&mut self, target: &RevisionTarget, revisions: &[Revision]) -> BackendResult<usize> {
        let current = if target.needs_current() {
            self.current_position(revisions)?.1
        } else {
            0
        };
        Ok(target.resolve(&ids(revisions), current)?)
    }
}

/// Resolve an offline `[start:]end` target to `(start, end)` positions
///
/// There is no applied revision to read, so `current` is rejected and
/// relative steps count from `start`. Without a start, `default_start` is
/// used and relative steps are only allowed when `relative_from_default` is
/// set.
fn offline_window(
    operation: &str,
    target: &MigrationTarget,
    revisions: &[Revision],
    default_start: usize,
    relative_from_default: bool,
) -> BackendResult<(usize, usize)> {
    let offline_error = || {
        BackendError::unsupported(format!(
            "Offline {} of {} needs a starting point; use start:end, head:-N or a revision id",
            operation, target
        ))
    };
    let ids = ids(revisions);

    let start = match &target.start {
        Some(start) if start.needs_current() => return Err(offline_error()),
        Some(start) => start.resolve(&ids, 0)?,
        None => default_start,
    };
    let end = match &target.end {
        RevisionTarget::Current => return Err(offline_error()),
        RevisionTarget::Relative(_) if target.start.is_none() && !relative_from_default => {
            return Err(offline_error());
        }
        end => end.resolve(&ids, start)?,
    };
    Ok((start, end))
}

fn online_only(operation: &str, target: &MigrationTarget) -> BackendResult<()> {
    if target.start.is_some() {
        return Err(BackendError::unsupported(format!(
            "Range revision {} is only accepted with --sql; {} starts from the current revision",
            target, operation
        )));
    }
    Ok(())
}

fn establish(database_url: &str) -> BackendResult<PgConnection> {
    if database_url.trim().is_empty() {
        return Err(BackendError::Connection {
            message: "database.url is not configured".to_string(),
        });
    }
    tracing::debug!("Connecting to database for migrations");
    PgConnection::establish(database_url).map_err(|e| BackendError::Connection {
        message: e.to_string(),
    })
}

fn ids(revisions: &[Revision]) -> Vec<&str> {
    revisions.iter().map(|r| r.id.as_str()).collect()
}

/// Name of the state after `position` revisions
fn position_label(revisions: &[Revision], position: usize) -> String {
    match position {
        0 => "base".to_string(),
        n => revisions[n - 1].id.clone(),
    }
}

fn missing_migration(revision: &Revision) -> BackendError {
    BackendError::Migration {
        version: revision.id.clone(),
        message: "script was not found by the migration loader".to_string(),
    }
}

fn log_environment_options(tag: Option<&str>, x_args: &[String]) {
    if tag.is_some() || !x_args.is_empty() {
        tracing::debug!(?tag, ?x_args, "Environment options have no consumer in this backend");
    }
}

impl MigrationBackend for DieselBackend {
    fn init(&mut self) -> BackendResult<Outcome> {
        self.scripts.init()?;
        tracing::info!(path = %self.scripts.root().display(), "Created migration script directory");
        Ok(Outcome::lines([
            format!("Creating directory {} ... done", self.scripts.root().display()),
            "Please set database.url in the configuration before proceeding.".to_string(),
        ]))
    }

    fn revision(&mut self, args: &RevisionArgs) -> BackendResult<Outcome> {
        let revisions = self.scripts.revisions()?;
        let base = args.head.resolve(&ids(&revisions), revisions.len())?;
        if base != revisions.len() {
            let reason = if args.splice {
                "splicing a new branch is not supported; revision history is linear"
            } else {
                "new revisions can only be based on the current head"
            };
            return Err(BackendError::unsupported(format!(
                "Revision {} is not a head revision: {}",
                args.head, reason
            )));
        }

        let id = args.rev_id.clone().unwrap_or_else(timestamp_revision_id);
        let scripts = match &args.version_path {
            Some(path) => {
                // The other directory is write-only here, so ids must stay
                // unique against the scripts that are actually applied.
                let version = id.replace('-', "");
                if revisions.iter().any(|r| r.version() == version) {
                    return Err(BackendError::DuplicateRevision { id });
                }
                tracing::warn!(
                    path = %path.display(),
                    "Revision written outside the migrations directory is not read by history or upgrade"
                );
                ScriptDirectory::new(path)
            }
            None => self.scripts.clone(),
        };
        let revision = scripts.create_revision(args.message.as_deref(), Some(id.as_str()))?;
        tracing::info!(revision = %revision.id, path = %revision.path.display(), "Created revision");

        Ok(Outcome::lines([
            format!("Generating {} ... done", revision.up_path().display()),
            format!("Generating {} ... done", revision.down_path().display()),
        ]))
    }

    fn merge(&mut self, args: &MergeArgs) -> BackendResult<Outcome> {
        let revisions = self.scripts.revisions()?;
        let ids = ids(&revisions);
        for target in &args.revisions {
            target.resolve(&ids, revisions.len())?;
        }
        let message = match revisions.last() {
            Some(head) => format!(
                "Only one head ({}) is present; revision history is linear and there is nothing to merge",
                head.id
            ),
            None => "No revisions to merge".to_string(),
        };
        Err(BackendError::unsupported(message))
    }

    fn upgrade(&mut self, args: &UpgradeArgs) -> BackendResult<Outcome> {
        log_environment_options(args.tag.as_deref(), &args.x_arg);
        let revisions = self.scripts.revisions()?;

        if args.sql {
            let (start, target) = offline_window("upgrade", &args.revision, &revisions, 0, true)?;
            if target < start {
                return Err(BackendError::unsupported(format!(
                    "Destination {} is not a valid upgrade target from revision {}",
                    position_label(&revisions, target),
                    position_label(&revisions, start)
                )));
            }
            let mut lines = Vec::new();
            for revision in &revisions[start..target] {
                lines.push(format!("-- Running upgrade -> {}", revision.label()));
                lines.push(revision.up_sql()?.trim_end().to_string());
                lines.push(String::new());
            }
            return Ok(Outcome::lines(lines));
        }

        online_only("upgrade", &args.revision)?;
        let (applied, current) = self.current_position(&revisions)?;
        let target = args.revision.end.resolve(&ids(&revisions), current)?;
        if target < current {
            return Err(BackendError::unsupported(format!(
                "Destination {} is not a valid upgrade target from current revision {}",
                position_label(&revisions, target),
                position_label(&revisions, current)
            )));
        }

        let pending: Vec<&Revision> = revisions[..target]
            .iter()
            .filter(|r| !applied.contains(&r.version()))
            .collect();
        if pending.is_empty() {
            return Ok(Outcome::message(format!(
                "No migrations to apply - database is already at {}",
                position_label(&revisions, current)
            )));
        }

        let migrations = self.loaded_migrations()?;
        let connection = self.connection()?;
        let mut lines = Vec::with_capacity(pending.len() + 1);
        for revision in pending {
            let migration = migrations
                .get(&revision.version())
                .ok_or_else(|| missing_migration(revision))?;
            tracing::info!(revision = %revision.id, "Running upgrade");
            connection
                .run_migration(&**migration)
                .map_err(|e| BackendError::Migration {
                    version: revision.id.clone(),
                    message: e.to_string(),
                })?;
            lines.push(format!("Running upgrade -> {}", revision.label()));
        }
        lines.push(format!(
            "Upgraded to revision {}",
            position_label(&revisions, target)
        ));
        Ok(Outcome::lines(lines))
    }

    fn downgrade(&mut self, args: &DowngradeArgs) -> BackendResult<Outcome> {
        log_environment_options(args.tag.as_deref(), &args.x_arg);
        let revisions = self.scripts.revisions()?;

        if args.sql {
            let len = revisions.len();
            let (start, target) = offline_window("downgrade", &args.revision, &revisions, len, false)?;
            if target > start {
                return Err(BackendError::unsupported(format!(
                    "Destination {} is not a valid downgrade target from revision {}",
                    position_label(&revisions, target),
                    position_label(&revisions, start)
                )));
            }
            let mut lines = Vec::new();
            for revision in revisions[target..start].iter().rev() {
                lines.push(format!("-- Running downgrade {} ->", revision.label()));
                lines.push(revision.down_sql()?.trim_end().to_string());
                lines.push(String::new());
            }
            return Ok(Outcome::lines(lines));
        }

        online_only("downgrade", &args.revision)?;
        let (applied, current) = self.current_position(&revisions)?;
        let target = args.revision.end.resolve(&ids(&revisions), current)?;
        if target > current {
            return Err(BackendError::unsupported(format!(
                "Destination {} is not a valid downgrade target from current revision {}",
                position_label(&revisions, target),
                position_label(&revisions, current)
            )));
        }

        let applied_above: Vec<&Revision> = revisions[target..current]
            .iter()
            .rev()
            .filter(|r| applied.contains(&r.version()))
            .collect();
        if applied_above.is_empty() {
            return Ok(Outcome::message(format!(
                "No migrations to revert - database is already at {}",
                position_label(&revisions, current)
            )));
        }

        let migrations = self.loaded_migrations()?;
        let connection = self.connection()?;
        let mut lines = Vec::with_capacity(applied_above.len() + 1);
        for revision in applied_above {
            let migration = migrations
                .get(&revision.version())
                .ok_or_else(|| missing_migration(revision))?;
            tracing::info!(revision = %revision.id, "Running downgrade");
            connection
                .revert_migration(&**migration)
                .map_err(|e| BackendError::Migration {
                    version: revision.id.clone(),
                    message: e.to_string(),
                })?;
            lines.push(format!("Running downgrade {} ->", revision.label()));
        }
        lines.push(format!(
            "Downgraded to revision {}",
            position_label(&revisions, target)
        ));
        Ok(Outcome::lines(lines))
    }

    fn show(&mut self, args: &ShowArgs) -> BackendResult<Outcome> {
        let revisions = self.scripts.revisions()?;
        let position = self.resolve(&args.revision, &revisions)?;
        if position == 0 {
            return Ok(Outcome::message("<base>"));
        }

        let revision = &revisions[position - 1];
        let head_marker = if position == revisions.len() { " (head)" } else { "" };
        let parent = position_label(&revisions, position - 1);
        Ok(Outcome::lines([
            format!("Rev: {}{}", revision.id, head_marker),
            format!("Parent: {}", parent),
            format!("Path: {}", revision.path.display()),
            String::new(),
            format!("    {}", revision.slug),
            String::new(),
            revision.up_sql()?.trim_end().to_string(),
        ]))
    }

    fn history(&mut self, args: &HistoryArgs) -> BackendResult<Outcome> {
        let revisions = self.scripts.revisions()?;
        let range = args.rev_range.clone().unwrap_or_default();
        let current = if range.needs_current() {
            Some(self.current_position(&revisions)?.1)
        } else {
            None
        };
        let window = range.resolve(&ids(&revisions), current.unwrap_or(0))?;

        let mut lines = Vec::new();
        for index in window.rev() {
            let revision = &revisions[index];
            let parent = if index == 0 {
                "<base>".to_string()
            } else {
                revisions[index - 1].id.clone()
            };
            let mut markers = String::new();
            if index + 1 == revisions.len() {
                markers.push_str(" (head)");
            }
            if current == Some(index + 1) {
                markers.push_str(" (current)");
            }
            if args.verbose {
                lines.push(format!("Rev: {}{}", revision.id, markers));
                lines.push(format!("Parent: {}", parent));
                lines.push(format!("Path: {}", revision.path.display()));
                lines.push(String::new());
                lines.push(format!("    {}", revision.slug));
                lines.push(String::new());
            } else {
                lines.push(format!(
                    "{} -> {}{}, {}",
                    parent, revision.id, markers, revision.slug
                ));
            }
        }
        Ok(Outcome::lines(lines))
    }

    fn heads(&mut self, args: &HeadsArgs) -> BackendResult<Outcome> {
        if args.resolve_dependencies {
            tracing::debug!("Revision history is linear; no dependencies to resolve");
        }
        let Some(head) = self.scripts.head()? else {
            return Ok(Outcome::empty());
        };
        if args.verbose {
            Ok(Outcome::lines([
                format!("Rev: {} (head)", head.id),
                format!("Path: {}", head.path.display()),
                String::new(),
                format!("    {}", head.slug),
            ]))
        } else {
            Ok(Outcome::message(format!("{} (head)", head.id)))
        }
    }

    fn branches(&mut self, args: &VerboseArgs) -> BackendResult<Outcome> {
        self.scripts.revisions()?;
        if args.verbose {
            Ok(Outcome::message("No branch points; revision history is linear"))
        } else {
            Ok(Outcome::empty())
        }
    }

    fn current(&mut self, args: &VerboseArgs) -> BackendResult<Outcome> {
        let revisions = self.scripts.revisions()?;
        let (_, position) = self.current_position(&revisions)?;
        if position == 0 {
            return Ok(Outcome::message("base"));
        }

        let revision = &revisions[position - 1];
        let head_marker = if position == revisions.len() { " (head)" } else { "" };
        let mut lines = vec![format!("{}{}", revision.id, head_marker)];
        if args.verbose {
            lines.push(format!("Path: {}", revision.path.display()));
            lines.push(format!("    {}", revision.slug));
        }
        Ok(Outcome::lines(lines))
    }

    fn stamp(&mut self, args: &StampArgs) -> BackendResult<Outcome> {
        log_environment_options(args.tag.as_deref(), &[]);
        let revisions = self.scripts.revisions()?;
        if args.sql && args.revision.needs_current() {
            return Err(BackendError::unsupported(format!(
                "Offline stamp of {} needs the applied revision; use head:-N or a revision id",
                args.revision
            )));
        }
        let target = self.resolve(&args.revision, &revisions)?;
        let versions: Vec<String> = revisions[..target].iter().map(Revision::version).collect();

        if args.sql {
            let mut lines = vec![format!("DELETE FROM {};", VERSION_TABLE)];
            lines.extend(versions.iter().map(|version| {
                format!("INSERT INTO {} (version) VALUES ('{}');", VERSION_TABLE, version)
            }));
            return Ok(Outcome::lines(lines));
        }

        let delete = format!("DELETE FROM {}", VERSION_TABLE);
        let insert = format!("INSERT INTO {} (version) VALUES ($1)", VERSION_TABLE);
        let connection = self.connection()?;
        connection
            .transaction::<_, diesel::result::Error, _>(|conn| {
                conn.setup()?;
                diesel::sql_query(&delete).execute(conn)?;
                for version in &versions {
                    diesel::sql_query(&insert).bind::<Text, _>(version.as_str()).execute(conn)?;
                }
                Ok(())
            })
            .map_err(|e| BackendError::database("stamp version table", e))?;

        tracing::info!(revision = %position_label(&revisions, target), "Stamped version table");
        Ok(Outcome::message(format!(
            "Stamped revision {}",
            position_label(&revisions, target)
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::{Command, Dispatcher};
    use std::fs;
    use tempfile::TempDir;

    fn offline_backend(temp: &TempDir) -> DieselBackend {
        DieselBackend::new(ScriptDirectory::new(temp.path().join("migrations")), "")
    }

    fn dispatch(backend: &mut DieselBackend, name: &str, args: &[&str]) -> Result<Option<String>, String> {
        Dispatcher::new(backend)
            .run(&Command::new(name, args.iter().copied()))
            .into_result()
            .map_err(|e| e.to_string())
    }

    fn seeded_backend(temp: &TempDir) -> DieselBackend {
        let mut backend = offline_backend(temp);
        dispatch(&mut backend, "init", &[]).unwrap();
        for (id, message) in [("2024-01-01-000000", "create users"), ("2024-02-01-000000", "add email")] {
            dispatch(&mut backend, "revision", &["-m", message, "--rev-id", id]).unwrap();
        }
        let users = backend
            .scripts()
            .revisions()
            .unwrap()
            .into_iter()
            .next()
            .unwrap();
        fs::write(users.up_path(), "CREATE TABLE users (id SERIAL PRIMARY KEY);\n").unwrap();
        fs::write(users.down_path(), "DROP TABLE users;\n").unwrap();
        backend
    }

    #[test]
    fn test_init_then_revision() {
        let temp = TempDir::new().unwrap();
        let mut backend = offline_backend(&temp);

        let out = dispatch(&mut backend, "init", &[]).unwrap().unwrap();
        assert!(out.contains("Creating directory"));

        let out = dispatch(&mut backend, "revision", &["-m", "First one"]).unwrap().unwrap();
        assert!(out.contains("first_one"));
        assert_eq!(backend.scripts().revisions().unwrap().len(), 1);

        let err = dispatch(&mut backend, "init", &[]).unwrap_err();
        assert!(err.contains("not empty"));
    }

    #[test]
    fn test_commands_without_init_point_at_init() {
        let temp = TempDir::new().unwrap();
        let mut backend = offline_backend(&temp);

        let err = dispatch(&mut backend, "history", &[]).unwrap_err();
        assert!(err.contains("Please use the 'init' command"));
    }

    #[test]
    fn test_history_newest_first() {
        let temp = TempDir::new().unwrap();
        let mut backend = seeded_backend(&temp);

        let out = dispatch(&mut backend, "history", &[]).unwrap().unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "2024-01-01-000000 -> 2024-02-01-000000 (head), add_email",
                "<base> -> 2024-01-01-000000, create_users",
            ]
        );

        let out = dispatch(&mut backend, "history", &["-r", "2024-02:"]).unwrap().unwrap();
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn test_history_range_includes_start_revision() {
        let temp = TempDir::new().unwrap();
        let mut backend = seeded_backend(&temp);

        let out = dispatch(&mut backend, "history", &["-r", "2024-01:"]).unwrap().unwrap();
        assert_eq!(out.lines().count(), 2);

        let out = dispatch(&mut backend, "history", &["-r", "2024-01:2024-01"]).unwrap().unwrap();
        assert_eq!(out, "<base> -> 2024-01-01-000000, create_users");
    }

    #[test]
    fn test_heads_show_and_branches() {
        let temp = TempDir::new().unwrap();
        let mut backend = seeded_backend(&temp);

        let out = dispatch(&mut backend, "heads", &[]).unwrap().unwrap();
        assert_eq!(out, "2024-02-01-000000 (head)");

        let out = dispatch(&mut backend, "show", &["2024-01"]).unwrap().unwrap();
        assert!(out.starts_with("Rev: 2024-01-01-000000\n"));
        assert!(out.contains("CREATE TABLE users"));

        assert_eq!(dispatch(&mut backend, "show", &["base"]).unwrap().as_deref(), Some("<base>"));
        assert_eq!(dispatch(&mut backend, "branches", &[]).unwrap(), None);
    }

    #[test]
    fn test_merge_reports_linear_history() {
        let temp = TempDir::new().unwrap();
        let mut backend = seeded_backend(&temp);

        let err = dispatch(&mut backend, "merge", &["heads"]).unwrap_err();
        assert!(err.contains("nothing to merge"));

        let err = dispatch(&mut backend, "merge", &["nope"]).unwrap_err();
        assert!(err.contains("Can't locate revision"));
    }

    #[test]
    fn test_revision_rejects_non_head_base() {
        let temp = TempDir::new().unwrap();
        let mut backend = seeded_backend(&temp);

        let err = dispatch(&mut backend, "revision", &["--head", "2024-01"]).unwrap_err();
        assert!(err.contains("not a head revision"));
    }

    #[test]
    fn test_offline_upgrade_prints_scripts() {
        let temp = TempDir::new().unwrap();
        let mut backend = seeded_backend(&temp);

        let out = dispatch(&mut backend, "upgrade", &["--sql"]).unwrap().unwrap();
        assert!(out.contains("-- Running upgrade -> 2024-01-01-000000 (create_users)"));
        assert!(out.contains("CREATE TABLE users"));
        assert!(out.contains("2024-02-01-000000"));

        let out = dispatch(&mut backend, "upgrade", &["2024-01", "--sql"]).unwrap().unwrap();
        assert!(!out.contains("2024-02-01-000000"));
    }

    #[test]
    fn test_offline_upgrade_renders_start_end_window() {
        let temp = TempDir::new().unwrap();
        let mut backend = seeded_backend(&temp);

        let out = dispatch(&mut backend, "upgrade", &["2024-01:head", "--sql"]).unwrap().unwrap();
        assert!(!out.contains("CREATE TABLE users"));
        assert!(out.contains("-- Running upgrade -> 2024-02-01-000000 (add_email)"));

        let out = dispatch(&mut backend, "upgrade", &["base:+1", "--sql"]).unwrap().unwrap();
        assert!(out.contains("CREATE TABLE users"));
        assert!(!out.contains("2024-02-01-000000"));

        let err = dispatch(&mut backend, "upgrade", &["head:base", "--sql"]).unwrap_err();
        assert!(err.contains("not a valid upgrade target"));

        let err = dispatch(&mut backend, "upgrade", &["current:head", "--sql"]).unwrap_err();
        assert!(err.contains("needs a starting point"));
    }

    #[test]
    fn test_start_end_window_requires_sql() {
        let temp = TempDir::new().unwrap();
        let mut backend = seeded_backend(&temp);

        let err = dispatch(&mut backend, "upgrade", &["2024-01:head"]).unwrap_err();
        assert!(err.contains("only accepted with --sql"));

        let err = dispatch(&mut backend, "downgrade", &["head:base"]).unwrap_err();
        assert!(err.contains("only accepted with --sql"));
    }

    #[test]
    fn test_offline_downgrade_renders_start_end_window() {
        let temp = TempDir::new().unwrap();
        let mut backend = seeded_backend(&temp);

        let out = dispatch(&mut backend, "downgrade", &["2024-01:base", "--sql"]).unwrap().unwrap();
        assert!(out.contains("DROP TABLE users"));
        assert!(!out.contains("2024-02-01-000000"));

        let out = dispatch(&mut backend, "downgrade", &["head:-1", "--sql"]).unwrap().unwrap();
        assert!(out.contains("-- Running downgrade 2024-02-01-000000"));

        let err = dispatch(&mut backend, "downgrade", &["-2", "--sql"]).unwrap_err();
        assert!(err.contains("needs a starting point"));
    }

    #[test]
    fn test_offline_downgrade_defaults_to_one_step_from_head() {
        let temp = TempDir::new().unwrap();
        let mut backend = seeded_backend(&temp);

        let out = dispatch(&mut backend, "downgrade", &["--sql"]).unwrap().unwrap();
        assert!(out.contains("Running downgrade 2024-02-01-000000"));
        assert!(!out.contains("DROP TABLE users"));

        let out = dispatch(&mut backend, "downgrade", &["base", "--sql"]).unwrap().unwrap();
        assert!(out.contains("DROP TABLE users"));
    }

    #[test]
    fn test_offline_stamp_prints_statements() {
        let temp = TempDir::new().unwrap();
        let mut backend = seeded_backend(&temp);

        let out = dispatch(&mut backend, "stamp", &["2024-01", "--sql"]).unwrap().unwrap();
        assert_eq!(
            out,
            "DELETE FROM __diesel_schema_migrations;\n\
             INSERT INTO __diesel_schema_migrations (version) VALUES ('20240101000000');"
        );
    }

    #[test]
    fn test_offline_stamp_never_connects() {
        let temp = TempDir::new().unwrap();
        let mut backend = seeded_backend(&temp);

        for target in ["-1", "current"] {
            let err = dispatch(&mut backend, "stamp", &[target, "--sql"]).unwrap_err();
            assert!(err.contains("needs the applied revision"), "{}", err);
            assert!(!err.contains("connect"));
        }

        let out = dispatch(&mut backend, "stamp", &["head:-1", "--sql"]).unwrap().unwrap();
        assert!(out.contains("'20240101000000'"));
        assert!(!out.contains("'20240201000000'"));
    }

    #[test]
    fn test_revision_in_version_path_keeps_ids_unique() {
        let temp = TempDir::new().unwrap();
        let mut backend = seeded_backend(&temp);
        let elsewhere = temp.path().join("drafts");
        fs::create_dir(&elsewhere).unwrap();
        let elsewhere = elsewhere.to_str().unwrap();

        let err = dispatch(
            &mut backend,
            "revision",
            &["--rev-id", "2024-01-01-000000", "--version-path", elsewhere],
        )
        .unwrap_err();
        assert_eq!(err, "Revision 2024-01-01-000000 already exists");

        dispatch(
            &mut backend,
            "revision",
            &["-m", "draft", "--rev-id", "2024-03-01-000000", "--version-path", elsewhere],
        )
        .unwrap();
        assert_eq!(backend.scripts().revisions().unwrap().len(), 2);
        assert_eq!(ScriptDirectory::new(elsewhere).revisions().unwrap().len(), 1);
    }

    #[test]
    fn test_online_commands_need_database_url() {
        let temp = TempDir::new().unwrap();
        let mut backend = seeded_backend(&temp);

        for (name, args) in [("current", vec![]), ("upgrade", vec!["head"]), ("downgrade", vec!["-1"])] {
            let err = dispatch(&mut backend, name, &args).unwrap_err();
            assert_eq!(err, "Can't connect to database: database.url is not configured");
        }
    }
}
