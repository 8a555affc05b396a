//! Widget endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Redirect;
use axum::Json;

use crate::db::DashError;
use crate::models::{Widget, WidgetKind};
use crate::repo;
use crate::server::error::ServerError;
use crate::server::handlers::{non_empty, parse_id, redirect_back, redirect_to_page, FormFields};
use crate::server::state::AppState;
use crate::validation;

/// Handle POST `/widget/add/{page_id}`.
///
/// `kind` defaults to a link list.
pub(crate) async fn add_widget(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<i64>,
    body: String,
) -> Result<Redirect, ServerError> {
    let form = FormFields::parse(&body)?;
    let kind = match non_empty(form.get("kind")) {
        Some(k) => WidgetKind::from_str(k)
            .ok_or_else(|| DashError::InvalidInput(format!("Unknown widget kind: {k}")))?,
        None => WidgetKind::default(),
    };

    let conn = state.conn()?;
    let page = repo::get_page(&conn, page_id)?;
    let Some(title) = non_empty(form.get("title")) else {
        return Ok(redirect_to_page(&page.slug));
    };
    validation::validate_widget_title(title)?;

    let widget = repo::create_widget(&conn, page_id, title, kind)?;
    tracing::info!(widget_id = widget.id, page_id, kind = %widget.kind, "Created widget");
    Ok(redirect_to_page(&page.slug))
}

/// Handle GET `/widget/{id}/rename`: the widget as it stands, for the edit form.
pub(crate) async fn rename_widget_form(
    State(state): State<Arc<AppState>>,
    Path(widget_id): Path<i64>,
) -> Result<Json<Widget>, ServerError> {
    let conn = state.conn()?;
    Ok(Json(repo::get_widget(&conn, widget_id)?))
}

/// Handle POST `/widget/{id}/rename`. An empty title leaves the widget as is.
pub(crate) async fn rename_widget(
    State(state): State<Arc<AppState>>,
    Path(widget_id): Path<i64>,
    body: String,
) -> Result<Json<Widget>, ServerError> {
    let form = FormFields::parse(&body)?;
    let conn = state.conn()?;
    let Some(title) = non_empty(form.get("title")) else {
        return Ok(Json(repo::get_widget(&conn, widget_id)?));
    };
    validation::validate_widget_title(title)?;

    let widget = repo::rename_widget(&conn, widget_id, title)?;
    tracing::info!(widget_id, "Renamed widget");
    Ok(Json(widget))
}

/// Handle GET/POST `/widget/delete/{widget_id}`.
pub(crate) async fn delete_widget(
    State(state): State<Arc<AppState>>,
    Path(widget_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Redirect, ServerError> {
    let conn = state.conn()?;
    repo::delete_widget(&conn, widget_id)?;
    tracing::info!(widget_id, "Deleted widget");
    Ok(redirect_back(&headers))
}

/// Handle POST `/widget/move/{widget_id}`.
pub(crate) async fn move_widget(
    State(state): State<Arc<AppState>>,
    Path(widget_id): Path<i64>,
    headers: HeaderMap,
    body: String,
) -> Result<Redirect, ServerError> {
    let form = FormFields::parse(&body)?;
    let Some(target_page_id) = parse_id(form.get("target_page_id")) else {
        return Ok(redirect_back(&headers));
    };

    let conn = state.conn()?;
    let widget = repo::move_widget_to_page(&conn, widget_id, target_page_id)?;
    tracing::info!(widget_id, target_page_id, order = widget.order, "Moved widget");
    Ok(redirect_back(&headers))
}

/// Handle POST `/widget/save_note/{widget_id}` and `/api/save-note/{widget_id}`.
pub(crate) async fn save_note(
    State(state): State<Arc<AppState>>,
    Path(widget_id): Path<i64>,
    body: String,
) -> Result<StatusCode, ServerError> {
    let form = FormFields::parse(&body)?;
    let content = form.get("content").unwrap_or_default();
    validation::validate_note(content)?;

    let conn = state.conn()?;
    repo::set_widget_note_content(&conn, widget_id, content)?;
    tracing::debug!(widget_id, bytes = content.len(), "Saved note");
    Ok(StatusCode::OK)
}
