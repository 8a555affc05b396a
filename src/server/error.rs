//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::db::DashError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ServerError {
    /// Error raised by the store.
    #[error(transparent)]
    Store(#[from] DashError),

    /// Form body could not be decoded or lacks a required field.
    #[error("Invalid form data: {0}")]
    Form(String),

    /// A handler panicked while holding the database lock.
    #[error("Database lock poisoned")]
    LockPoisoned,
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Store(DashError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(DashError::NoTarget(_) | DashError::InvalidInput(_)) | Self::Form(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Store(_) | Self::LockPoisoned => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, axum::Json(json!({"error": self.to_string()}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found = ServerError::from(DashError::NotFound("Page with ID 1 not found".to_string()));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let no_target = ServerError::from(DashError::NoTarget("empty".to_string()));
        assert_eq!(no_target.status(), StatusCode::BAD_REQUEST);

        let invalid = ServerError::from(DashError::InvalidInput("too long".to_string()));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        assert_eq!(ServerError::Form("bad".to_string()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ServerError::LockPoisoned.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let db = ServerError::from(DashError::Db(rusqlite::Error::QueryReturnedNoRows));
        assert_eq!(db.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_message_passes_store_error_through() {
        let err = ServerError::from(DashError::NotFound("Link with ID 3 not found".to_string()));
        assert_eq!(err.to_string(), "Not found: Link with ID 3 not found");
    }
}
