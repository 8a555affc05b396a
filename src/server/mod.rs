//! HTTP server for the start page.
//!
//! Serves the dashboard as JSON views plus the form and drag-and-drop
//! endpoints a browser front end posts to. Every handler goes straight to
//! the store in [`crate::repo`].

mod app;
mod error;
mod handlers;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use crate::db::{self, DashError};
use state::AppState;

/// Server configuration.
#[derive(Debug, Clone)]
pub(crate) struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// SQLite database file.
    pub db_path: PathBuf,
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the database cannot be opened, the host does not
/// resolve, or the listener fails.
pub(crate) async fn run_server(config: ServerConfig) -> Result<(), DashError> {
    let mut conn = db::open_connection_at(&config.db_path)?;
    db::run_migrations(&mut conn)?;

    let state = Arc::new(AppState::new(conn));
    let app = app::create_router(state);

    // Hostnames such as `localhost` are resolved by the bind itself.
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(address = %listener.local_addr()?, db = %config.db_path.display(), "Starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_server_binds_hostname() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let config = ServerConfig {
            host: "localhost".to_string(),
            port: 0,
            db_path: dir.path().join("dash.db"),
        };

        // Still serving when the timeout fires means the bind succeeded.
        let result = tokio::time::timeout(Duration::from_millis(500), run_server(config)).await;
        assert!(result.is_err(), "server exited early: {:?}", result);
        assert!(dir.path().join("dash.db").exists());
    }
}
