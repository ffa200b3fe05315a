//! `pg_dump` / `pg_restore` wrappers.
//!
//! Commands are built separately from running them so the argument list
//! can be checked without the PostgreSQL client tools installed.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::PgConfig;
use crate::error::{AppError, AppResult};

/// Backup location used when `--location` is not given
pub const DEFAULT_LOCATION: &str = "db.pg_dump";

/// Password variable read by libpq-based tools
pub const PASSWORD_ENV: &str = "PGPASSWORD";

fn program(config: &PgConfig, name: &str) -> PathBuf {
    if config.bin_dir.is_empty() {
        PathBuf::from(name)
    } else {
        Path::new(&config.bin_dir).join(name)
    }
}

fn require_db_name(config: &PgConfig) -> AppResult<()> {
    if config.db_name.trim().is_empty() {
        return Err(AppError::Configuration {
            key: "pg.db_name".to_string(),
            source: anyhow::anyhow!("pg.db_name is not configured"),
        });
    }
    Ok(())
}

fn base_command(config: &PgConfig, name: &str) -> Command {
    let mut command = Command::new(program(config, name));
    command
        .arg(format!("--host={}", config.host))
        .arg(format!("--username={}", config.username));
    // Scoped to the child so the password never lands in this process's
    // environment.
    if !config.password.is_empty() {
        command.env(PASSWORD_ENV, &config.password);
    }
    command
}

/// `pg_dump --host=.. --username=.. --format=c <db> --file=<location>`
pub fn dump_command(config: &PgConfig, location: &Path) -> AppResult<Command> {
    require_db_name(config)?;
    let mut command = base_command(config, "pg_dump");
    command
        .arg("--format=c")
        .arg(&config.db_name)
        .arg(format!("--file={}", location.display()));
    Ok(command)
}

/// `pg_restore --host=.. --username=.. --dbname=<db> --clean <location>`
pub fn restore_command(config: &PgConfig, location: &Path) -> AppResult<Command> {
    require_db_name(config)?;
    if !location.is_file() {
        return Err(AppError::io(
            location,
            std::io::Error::new(std::io::ErrorKind::NotFound, "backup file not found"),
        ));
    }
    let mut command = base_command(config, "pg_restore");
    command
        .arg(format!("--dbname={}", config.db_name))
        .arg("--clean")
        .arg(location);
    Ok(command)
}

/// Run a tool to completion, failing on a non-zero exit status
pub fn run(mut command: Command) -> AppResult<()> {
    let program = command.get_program().to_string_lossy().into_owned();
    tracing::info!(program = %program, "Running external command");

    let status = command.status().map_err(|e| AppError::Command {
        program: program.clone(),
        message: e.to_string(),
    })?;

    if !status.success() {
        return Err(AppError::Command {
            program,
            message: status.to_string(),
        });
    }
    Ok(())
}
