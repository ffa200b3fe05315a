//! Whole-schema operations behind `create-all`, `drop-all` and `reset-all`.

use std::path::Path;

use diesel::connection::SimpleConnection;
use diesel::{Connection, PgConnection};

use crate::error::{AppError, AppResult};

/// Quote a PostgreSQL identifier
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Statements that remove every object in `schema` and leave it empty
pub fn drop_statements(schema: &str) -> String {
    let quoted = quote_identifier(schema);
    format!(
        "DROP SCHEMA IF EXISTS {} CASCADE;\nCREATE SCHEMA {};",
        quoted, quoted
    )
}

/// Read the schema definition file
pub fn read_schema_file(path: &Path) -> AppResult<String> {
    std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))
}

/// Create all objects by running the schema file in one transaction
///
/// Returns `false` when the file holds no SQL.
pub fn create_all(connection: &mut PgConnection, schema_file: &Path) -> AppResult<bool> {
    let sql = read_schema_file(schema_file)?;
    if sql.trim().is_empty() {
        tracing::warn!(path = %schema_file.display(), "Schema file is empty; nothing to create");
        return Ok(false);
    }

    tracing::info!(path = %schema_file.display(), "Creating all database objects");
    connection
        .transaction(|conn| conn.batch_execute(&sql))
        .map_err(|e| AppError::database("create all", e))?;
    Ok(true)
}

/// Drop every object in `schema` and recreate it empty
pub fn drop_all(connection: &mut PgConnection, schema: &str) -> AppResult<()> {
    tracing::info!(schema, "Dropping all database objects");
    let statements = drop_statements(schema);
    connection
        .transaction(|conn| conn.batch_execute(&statements))
        .map_err(|e| AppError::database("drop all", e))
}
