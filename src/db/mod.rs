//! Database access for the schema commands.
//!
//! Provides a single synchronous PostgreSQL connection per command, the
//! schema create/drop helpers and the `pg_dump` / `pg_restore` wrappers.

pub mod pg_tools;
pub mod schema;

use diesel::{Connection, PgConnection};

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

/// Open a connection to `database.url`.
///
/// # Errors
///
/// - `AppError::Configuration` - if `database.url` is empty
/// - `AppError::Database` - if the server refuses the connection
pub fn establish_connection(config: &DatabaseConfig) -> AppResult<PgConnection> {
    if config.url.trim().is_empty() {
        return Err(AppError::Configuration {
            key: "database.url".to_string(),
            source: anyhow::anyhow!("database.url is not configured"),
        });
    }

    tracing::debug!("Connecting to database");
    Ok(PgConnection::establish(&config.url)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_establish_connection_requires_url() {
        let Err(err) = establish_connection(&DatabaseConfig::default()) else {
            panic!("Expected a configuration error without database.url");
        };
        assert!(matches!(err, AppError::Configuration { ref key, .. } if key == "database.url"));
    }
}
