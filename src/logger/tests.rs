//! Tests for the logger module

use crate::logger::config::*;
use crate::logger::writer::FileWriter;
use std::path::PathBuf;

#[cfg(test)]
mod writer_tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;
    use tracing_subscriber::fmt::MakeWriter;

    fn file_config(path: PathBuf, append: bool) -> FileConfig {
        FileConfig {
            enabled: true,
            path,
            append,
            format: LogFormat::Full,
        }
    }

    #[test]
    fn test_writer_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("logs").join("dbadmin.log");

        let writer = FileWriter::new(&file_config(path.clone(), true)).unwrap();
        writer.make_writer().write_all(b"first line\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first line\n");
        assert!(!writer.is_in_fallback_mode());
    }

    #[test]
    fn test_writer_append_and_truncate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dbadmin.log");
        fs::write(&path, "old\n").unwrap();

        let writer = FileWriter::new(&file_config(path.clone(), true)).unwrap();
        writer.make_writer().write_all(b"new\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");

        let writer = FileWriter::new(&file_config(path.clone(), false)).unwrap();
        writer.make_writer().write_all(b"fresh\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\n");
    }

    #[test]
    fn test_writer_guards_share_one_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dbadmin.log");
        let writer = FileWriter::new(&file_config(path.clone(), true)).unwrap();

        let mut first = writer.make_writer();
        let mut second = writer.make_writer();
        first.write_all(b"a\n").unwrap();
        second.write_all(b"b\n").unwrap();
        first.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\n");
    }

    #[test]
    fn test_writer_fails_when_path_is_a_directory() {
        let dir = tempdir().unwrap();
        assert!(FileWriter::new(&file_config(dir.path().to_path_buf(), true)).is_err());
    }
}

#[cfg(test)]
mod subscriber_tests {
    use super::*;
    use crate::logger::both_dispatch;
    use std::fs;
    use tempfile::tempdir;
    use tracing_subscriber::EnvFilter;

    #[test]
    fn test_console_and_file_build_for_every_format() {
        for format in LogFormat::ALL {
            let dir = tempdir().unwrap();
            let path = dir.path().join("dbadmin.log");
            let config = LoggerConfig {
                console: ConsoleConfig::new(true, false),
                file: FileConfig {
                    enabled: true,
                    path: path.clone(),
                    append: true,
                    format,
                },
                level: "info".to_string(),
            };

            let dispatch = both_dispatch(&config, EnvFilter::new("info")).unwrap();
            tracing::dispatcher::with_default(&dispatch, || {
                tracing::info!(revision = "2024-01-01-000000", "Running upgrade");
                tracing::debug!("filtered out");
            });

            let written = fs::read_to_string(&path).unwrap();
            assert!(written.contains("Running upgrade"), "{}: {}", format.as_str(), written);
            assert!(written.contains("2024-01-01-000000"));
            assert!(!written.contains("filtered out"));
        }
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn property_valid_configs_validate(
            console_enabled in any::<bool>(),
            file_enabled in any::<bool>(),
            colored in any::<bool>(),
            append in any::<bool>(),
            level in prop_oneof![Just("trace"), Just("debug"), Just("info"), Just("warn"), Just("error")],
        ) {
            prop_assume!(console_enabled || file_enabled);

            let config = LoggerConfig {
                console: ConsoleConfig::new(console_enabled, colored),
                file: FileConfig {
                    enabled: file_enabled,
                    path: PathBuf::from("test.log"),
                    append,
                    format: LogFormat::Full,
                },
                level: level.to_string(),
            };

            prop_assert!(config.validate().is_ok());
            prop_assert!(config.parse_level().is_ok());
        }

        #[test]
        fn property_invalid_levels_fail(invalid_level in "[a-z]{1,10}[A-Z0-9]{1,5}") {
            prop_assume!(!["trace", "debug", "info", "warn", "error"]
                .contains(&invalid_level.to_lowercase().as_str()));

            let config = LoggerConfig::default().with_level(invalid_level);
            prop_assert!(config.validate().is_err());
        }
    }
}
