//! CLI argument validation functions
//!
//! This module provides custom validation functions for CLI arguments
//! that go beyond what clap can validate automatically.

use std::fs;
use std::path::PathBuf;

/// Validate that a file path is accessible (exists and is readable)
pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(format!("Configuration file does not exist: '{}'", path_str));
    }

    if !path.is_file() {
        return Err(format!("Configuration path is not a file: '{}'", path_str));
    }

    match fs::File::open(&path) {
        Ok(_) => Ok(path),
        Err(e) => Err(format!("Cannot read configuration file '{}': {}", path_str, e)),
    }
}

/// Validate a backup location for `pg dump` / `pg restore`
pub fn validate_location(location: &str) -> Result<PathBuf, String> {
    if location.trim().is_empty() {
        return Err("Backup location cannot be empty".to_string());
    }

    let path = PathBuf::from(location);
    if path.is_dir() {
        return Err(format!("Backup location is a directory: '{}'", location));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_config_file_path() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("dbadmin.toml");
        fs::write(&file, "[database]\n").unwrap();

        assert_eq!(validate_config_file_path(file.to_str().unwrap()).unwrap(), file);

        let err = validate_config_file_path(temp.path().join("nope.toml").to_str().unwrap()).unwrap_err();
        assert!(err.contains("does not exist"));

        let err = validate_config_file_path(temp.path().to_str().unwrap()).unwrap_err();
        assert!(err.contains("not a file"));
    }

    #[test]
    fn test_validate_location() {
        assert_eq!(validate_location("db.pg_dump").unwrap(), PathBuf::from("db.pg_dump"));
        assert!(validate_location("  ").is_err());

        let temp = TempDir::new().unwrap();
        assert!(validate_location(temp.path().to_str().unwrap()).is_err());
    }
}
