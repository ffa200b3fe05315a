use std::error::Error as _;
use std::process::ExitCode;

use clap::Parser;

use dbadmin::cli::{Cli, execute_command, init_logger_from_settings, load_and_merge_config};
use dbadmin::error::{AppError, AppResult};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: &Cli) -> AppResult<()> {
    let settings = load_and_merge_config(cli)?;
    init_logger_from_settings(&settings)?;

    tracing::debug!(
        app = %settings.application.name,
        version = %settings.application.version,
        command = ?cli.command,
        "Starting"
    );
    execute_command(cli, settings)
}

fn report(err: &AppError) {
    tracing::debug!(exit_code = err.exit_code(), "Command failed");

    eprintln!("Error: {}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  Caused by: {}", cause);
        source = cause.source();
    }
}
