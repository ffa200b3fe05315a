//! Migrate command handler
//!
//! Hands the words after `migrate` to the dispatcher, backed by the diesel
//! migration backend.

use std::io::{self, Write};

use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};
use crate::migration::{Command, DieselBackend, Dispatcher, MigrationBackend};

/// Handler for the migrate command
pub struct MigrateCommandHandler {
    config: Settings,
}

impl MigrateCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Run one migrate operation against the configured backend
    ///
    /// The dispatcher's message goes to stdout. A failure is returned as
    /// `AppError::Dispatch`, leaving the caller to print it and to exit with
    /// the dispatcher's code.
    pub fn execute(&self, words: &[String]) -> AppResult<()> {
        let mut backend = DieselBackend::from_settings(&self.config);
        self.execute_with(&mut backend, words, &mut io::stdout().lock())
    }

    pub fn execute_with<B: MigrationBackend + ?Sized, O: Write>(
        &self,
        backend: &mut B,
        words: &[String],
        out: &mut O,
    ) -> AppResult<()> {
        let command = Command::from_words(words)?;
        let result = Dispatcher::new(backend).run(&command);

        result
            .write_message(out)
            .map_err(|e| AppError::Internal { source: e.into() })?;
        result.into_result()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn settings_in(dir: &TempDir) -> Settings {
        let mut settings = Settings::default();
        settings.migrations.directory = dir.path().join("migrations");
        settings
    }

    #[test]
    fn test_init_then_revision() {
        let dir = TempDir::new().unwrap();
        let handler = MigrateCommandHandler::new(settings_in(&dir));

        handler.execute(&words(&["init"])).unwrap();
        handler.execute(&words(&["revision", "-m", "create users"])).unwrap();

        let revisions = std::fs::read_dir(dir.path().join("migrations"))
            .unwrap()
            .filter(|entry| entry.as_ref().unwrap().path().is_dir())
            .count();
        assert_eq!(revisions, 1);
    }

    #[test]
    fn test_empty_words_is_usage_error() {
        let dir = TempDir::new().unwrap();
        let err = MigrateCommandHandler::new(settings_in(&dir))
            .execute(&[])
            .unwrap_err();

        assert!(matches!(err, AppError::Dispatch(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_backend_failure_exit_code() {
        let dir = TempDir::new().unwrap();
        let err = MigrateCommandHandler::new(settings_in(&dir))
            .execute(&words(&["upgrade"]))
            .unwrap_err();

        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_message_is_written_to_output() {
        let dir = TempDir::new().unwrap();
        let handler = MigrateCommandHandler::new(settings_in(&dir));
        let mut backend = DieselBackend::from_settings(&handler.config);

        let mut out = Vec::new();
        handler.execute_with(&mut backend, &words(&["init"]), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Creating directory"), "{}", text);
        assert!(text.ends_with('\n'));

        let mut out = Vec::new();
        let err = handler
            .execute_with(&mut backend, &words(&["init"]), &mut out)
            .unwrap_err();
        assert!(out.is_empty());
        assert!(err.to_string().contains("not empty"));
    }

    #[test]
    fn test_help_succeeds() {
        let dir = TempDir::new().unwrap();
        MigrateCommandHandler::new(settings_in(&dir))
            .execute(&words(&["help"]))
            .unwrap();
    }
}
