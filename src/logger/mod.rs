//! Logger Module
//!
//! A logging system based on `tracing-subscriber` with support for:
//! - Console output on stderr with color control
//! - File output with multiple formats (Full, Compact, JSON)

pub mod config;
pub mod error;
pub(crate) mod writer;

#[cfg(test)]
mod tests;

pub use config::*;
pub use error::LoggerError;

use std::io::IsTerminal;

use tracing::{Dispatch, Subscriber};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use writer::FileWriter;

/// Initialize the global subscriber with the given configuration
pub fn init_logger(config: LoggerConfig) -> anyhow::Result<()> {
    config.validate()?;

    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    match (config.console.enabled, config.file.enabled) {
        (true, true) => init_both(&config, filter)?,
        (true, false) => init_console_only(&config.console, filter)?,
        (false, true) => init_file_only(&config.file, filter)?,
        (false, false) => anyhow::bail!("At least one output (console or file) must be enabled"),
    }

    Ok(())
}

fn console_ansi(config: &ConsoleConfig) -> bool {
    config.colored && std::io::stderr().is_terminal()
}

/// Console layer on stderr, built for whichever subscriber it is added to
fn console_layer<S>(ansi: bool) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(true)
        .with_level(true)
}

fn init_console_only(config: &ConsoleConfig, filter: EnvFilter) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer(console_ansi(config)))
        .try_init()?;
    Ok(())
}

fn init_file_only(config: &FileConfig, filter: EnvFilter) -> anyhow::Result<()> {
    let writer = FileWriter::new(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Full => registry
            .with(fmt::layer().with_ansi(false).with_target(true).with_writer(writer))
            .try_init()?,
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .compact()
                    .with_writer(writer),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(fmt::layer().with_ansi(false).json().with_writer(writer))
            .try_init()?,
    }

    Ok(())
}

fn init_both(config: &LoggerConfig, filter: EnvFilter) -> anyhow::Result<()> {
    both_dispatch(config, filter)?.try_init()?;
    Ok(())
}

/// Subscriber writing to the log file and the console
fn both_dispatch(config: &LoggerConfig, filter: EnvFilter) -> anyhow::Result<Dispatch> {
    let writer = FileWriter::new(&config.file)?;
    let ansi = console_ansi(&config.console);

    // The file layer goes first so ANSI escapes from the console layer don't
    // end up in span fields written to the file (tokio-rs/tracing#1817).
    let registry = tracing_subscriber::registry().with(filter);
    let dispatch = match config.file.format {
        LogFormat::Full => Dispatch::new(
            registry
                .with(fmt::layer().with_ansi(false).with_target(true).with_writer(writer))
                .with(console_layer(ansi)),
        ),
        LogFormat::Compact => Dispatch::new(
            registry
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_target(true)
                        .compact()
                        .with_writer(writer),
                )
                .with(console_layer(ansi)),
        ),
        LogFormat::Json => Dispatch::new(
            registry
                .with(fmt::layer().with_ansi(false).json().with_writer(writer))
                .with(console_layer(ansi)),
        ),
    };

    Ok(dispatch)
}
