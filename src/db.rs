//! Database connection management, migrations, and error types.
//!
//! This module handles all SQLite connection setup with appropriate settings
//! for concurrent access (WAL mode, foreign keys, busy timeout), schema
//! versioning via migrations, and a unified error type for the entire crate.

use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Central error type for the dashboard.
///
/// Every store operation returns this type. The HTTP layer maps each variant
/// onto a status code, the CLI prints it as a JSON error object.
#[derive(Debug, Error)]
pub enum DashError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    /// I/O operation failed (file/directory creation, reading an import file, etc).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Requested entity was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A move had no valid destination (e.g. the target page has no widgets).
    #[error("No target: {0}")]
    NoTarget(String),

    /// Invalid input provided by the user or caller.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Returns the path to the SQLite database file.
///
/// Resolution order:
/// 1. `STARTPAGE_DB` environment variable (if set)
/// 2. `~/.startpage/startpage.db` (default)
///
/// # Errors
///
/// Returns `DashError::Io` if the home directory cannot be determined
/// (when `STARTPAGE_DB` is not set).
pub fn db_path() -> Result<PathBuf, DashError> {
    if let Ok(path) = std::env::var("STARTPAGE_DB") {
        return Ok(PathBuf::from(path));
    }
    let home = dirs::home_dir().ok_or_else(|| {
        DashError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;
    Ok(home.join(".startpage").join("startpage.db"))
}

/// Opens a SQLite connection at the specified path with proper settings.
///
/// Creates the parent directory if it doesn't exist. Configured so the server
/// and the CLI can share one database file:
/// - **WAL mode**: Allows concurrent readers with serialized writers
/// - **Foreign keys**: Enabled so page/widget deletes cascade
/// - **Busy timeout**: 5 seconds to handle write contention gracefully
///
/// # Errors
///
/// Returns `DashError::Io` if the parent directory cannot be created and
/// `DashError::Db` if the connection cannot be opened or configured.
pub fn open_connection_at(path: &Path) -> Result<Connection, DashError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    configure(&conn)?;
    // WAL is meaningless for in-memory databases, so only the file path sets it.
    conn.pragma_update(None, "journal_mode", "WAL")?;

    Ok(conn)
}

/// Opens a fresh in-memory database with migrations applied.
///
/// Used by tests throughout the crate.
#[cfg(test)]
pub fn open_in_memory() -> Result<Connection, DashError> {
    let mut conn = Connection::open_in_memory()?;
    configure(&conn)?;
    run_migrations(&mut conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<(), DashError> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(())
}

/// Runs all pending database migrations.
///
/// Reads the current version from `schema_meta` (0 if the table doesn't
/// exist), then applies each embedded migration with a higher version in its
/// own transaction. Each migration updates `schema_meta.version` itself.
///
/// # Errors
///
/// Returns `DashError::Db` if a migration fails; that migration is rolled back.
pub fn run_migrations(conn: &mut Connection) -> Result<(), DashError> {
    let current_version: i64 = conn
        .query_row("SELECT version FROM schema_meta LIMIT 1", [], |row| row.get(0))
        .unwrap_or(0); // Fresh database starts at version 0

    let migrations: Vec<(i64, &str)> = vec![(1, include_str!("../migrations/001_initial.sql"))];

    for (target_version, sql) in migrations {
        if target_version > current_version {
            let tx = conn.transaction()?;
            tx.execute_batch(sql)?;
            tx.commit()?;
            tracing::debug!(version = target_version, "applied migration");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_db_path_env_override_and_default() {
        let custom_path = env::temp_dir().join("custom_startpage_test.db");

        env::set_var("STARTPAGE_DB", &custom_path);
        let result = db_path().expect("db_path should succeed");
        env::remove_var("STARTPAGE_DB");
        assert_eq!(result, custom_path);

        let fallback = db_path().expect("db_path should succeed with default");
        assert!(fallback.to_string_lossy().contains(".startpage"));
        assert!(fallback.to_string_lossy().ends_with("startpage.db"));
    }

    #[test]
    fn test_migration_creates_tables_from_scratch() {
        let conn = open_in_memory().expect("in-memory database");

        let version: i64 = conn
            .query_row("SELECT version FROM schema_meta", [], |row| row.get(0))
            .expect("schema_meta should exist");
        assert_eq!(version, 1);

        let table_names: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .expect("Failed to prepare query")
            .query_map([], |row| row.get(0))
            .expect("Failed to query tables")
            .collect::<Result<Vec<_>, _>>()
            .expect("Failed to collect table names");

        for table in ["schema_meta", "pages", "widgets", "links"] {
            assert!(table_names.contains(&table.to_string()), "missing table {table}");
        }
    }

    #[test]
    fn test_migration_is_idempotent() {
        let mut conn = open_in_memory().expect("in-memory database");
        run_migrations(&mut conn).expect("Second migration should succeed");

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_meta", [], |row| row.get(0))
            .expect("schema_meta should exist");
        assert_eq!(rows, 1);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))
            .expect("Should be able to query pages table");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_open_connection_at_configures_correctly() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("config.db");

        let conn = open_connection_at(&path).expect("Should open connection");

        let journal_mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .expect("Should query journal_mode");
        assert_eq!(journal_mode.to_lowercase(), "wal");

        let foreign_keys: i64 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .expect("Should query foreign_keys");
        assert_eq!(foreign_keys, 1);
        assert!(path.exists());
    }
}
