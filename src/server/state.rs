//! Application state.
//!
//! Shared state for all request handlers.

use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::server::error::ServerError;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// The one SQLite connection; each handler holds the lock for a single
    /// store call and never across an `.await`.
    db: Mutex<Connection>,
}

impl AppState {
    pub(crate) fn new(conn: Connection) -> Self {
        Self { db: Mutex::new(conn) }
    }

    /// Lock the database connection.
    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>, ServerError> {
        self.db.lock().map_err(|_| ServerError::LockPoisoned)
    }
}
