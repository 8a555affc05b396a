//! Backup download endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use crate::server::error::ServerError;
use crate::server::state::AppState;
use crate::transfer;

/// Handle GET `/api/backup`: the whole dashboard as a downloadable JSON file.
pub(crate) async fn download_backup(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ServerError> {
    let backup = {
        let conn = state.conn()?;
        transfer::export_backup(&conn)?
    };

    let filename = format!("startpage-backup-{}.json", Utc::now().format("%Y%m%d-%H%M%S"));
    tracing::info!(pages = backup.pages.len(), %filename, "Exported backup");

    Ok((
        [(header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\""))],
        Json(backup),
    ))
}
