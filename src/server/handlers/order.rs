//! Drag-and-drop endpoints.
//!
//! The front end posts the full new sequence of a container after every drop.
//! Ids that no longer exist are skipped by the store, so a stale page never
//! fails a reorder.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use rusqlite::Connection;

use crate::db::DashError;
use crate::repo;
use crate::server::error::ServerError;
use crate::server::handlers::{parse_id, FormFields};
use crate::server::state::AppState;

/// Handle POST `/api/update-order`: `widget_id` plus the widget's links in
/// their new order (`link` or `link[]`, repeated).
///
/// Links dragged in from another widget are reparented here.
pub(crate) async fn update_link_order(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<StatusCode, ServerError> {
    let form = FormFields::parse(&body)?;
    let Some(widget_id) = parse_id(form.get("widget_id")) else {
        return Ok(StatusCode::OK);
    };
    let ids = form.ids("link");

    let conn = state.conn()?;
    let updated = repo::reorder_links(&conn, widget_id, &ids)?;
    tracing::info!(widget_id, requested = ids.len(), updated, "Reordered links");
    Ok(StatusCode::OK)
}

/// Handle POST `/api/update-widget-order`: widgets of one page in their new
/// order (`widget`, repeated).
///
/// Without `page_id` the page is taken from the first widget that exists.
pub(crate) async fn update_widget_order(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<StatusCode, ServerError> {
    let form = FormFields::parse(&body)?;
    let ids = form.ids("widget");

    let conn = state.conn()?;
    let page_id = match parse_id(form.get("page_id")) {
        Some(id) => Some(id),
        None => page_of_first_known_widget(&conn, &ids)?,
    };
    let Some(page_id) = page_id else {
        return Ok(StatusCode::OK);
    };

    let updated = repo::reorder_widgets(&conn, page_id, &ids)?;
    tracing::info!(page_id, requested = ids.len(), updated, "Reordered widgets");
    Ok(StatusCode::OK)
}

fn page_of_first_known_widget(conn: &Connection, ids: &[i64]) -> Result<Option<i64>, DashError> {
    for &id in ids {
        match repo::get_widget(conn, id) {
            Ok(widget) => return Ok(Some(widget.page_id)),
            Err(DashError::NotFound(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

/// Handle POST `/api/update-page-order`: all tabs in their new order (`page`,
/// repeated).
pub(crate) async fn update_page_order(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<StatusCode, ServerError> {
    let form = FormFields::parse(&body)?;
    let ids = form.ids("page");

    let conn = state.conn()?;
    let updated = repo::reorder_pages(&conn, &ids)?;
    tracing::info!(requested = ids.len(), updated, "Reordered pages");
    Ok(StatusCode::OK)
}

/// Handle POST `/api/move-link/{link_id}`: a link dropped onto a tab.
pub(crate) async fn move_link(
    State(state): State<Arc<AppState>>,
    Path(link_id): Path<i64>,
    body: String,
) -> Result<StatusCode, ServerError> {
    let form = FormFields::parse(&body)?;
    let target_page_id = parse_id(form.get("target_page_id"))
        .ok_or_else(|| ServerError::Form("target_page_id is required".to_string()))?;

    let conn = state.conn()?;
    let link = repo::move_link_to_page(&conn, link_id, target_page_id)?;
    tracing::info!(link_id, target_page_id, widget_id = link.widget_id, "Moved link to page");
    Ok(StatusCode::OK)
}
