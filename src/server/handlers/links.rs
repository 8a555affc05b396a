//! Link endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Redirect;
use axum::Json;

use crate::models::Link;
use crate::repo;
use crate::server::error::ServerError;
use crate::server::handlers::{non_empty, redirect_back, FormFields};
use crate::server::state::AppState;
use crate::validation;

/// Handle POST `/link/add/{widget_id}`.
pub(crate) async fn add_link(
    State(state): State<Arc<AppState>>,
    Path(widget_id): Path<i64>,
    headers: HeaderMap,
    body: String,
) -> Result<Redirect, ServerError> {
    let form = FormFields::parse(&body)?;
    let Some(title) = non_empty(form.get("title")) else {
        return Ok(redirect_back(&headers));
    };
    let url = form.get("url").unwrap_or_default().trim();
    let icon_url = form.get("icon_url").unwrap_or_default().trim();
    validation::validate_link(title, url, icon_url)?;

    let conn = state.conn()?;
    let link = repo::create_link(&conn, widget_id, title, url, icon_url)?;
    tracing::info!(link_id = link.id, widget_id, "Created link");
    Ok(redirect_back(&headers))
}

/// Handle GET `/link/{id}/edit`: the link as it stands, for the edit form.
pub(crate) async fn edit_link_form(
    State(state): State<Arc<AppState>>,
    Path(link_id): Path<i64>,
) -> Result<Json<Link>, ServerError> {
    let conn = state.conn()?;
    Ok(Json(repo::get_link(&conn, link_id)?))
}

/// Handle POST `/link/{id}/edit`.
///
/// An empty title leaves the link as is; `url` may be cleared.
pub(crate) async fn edit_link(
    State(state): State<Arc<AppState>>,
    Path(link_id): Path<i64>,
    body: String,
) -> Result<Json<Link>, ServerError> {
    let form = FormFields::parse(&body)?;
    let conn = state.conn()?;
    let Some(title) = non_empty(form.get("title")) else {
        return Ok(Json(repo::get_link(&conn, link_id)?));
    };
    let url = form.get("url").unwrap_or_default().trim();
    validation::validate_link(title, url, "")?;

    let link = repo::rename_link(&conn, link_id, title, url)?;
    tracing::info!(link_id, "Edited link");
    Ok(Json(link))
}

/// Handle GET/POST `/link/delete/{link_id}`.
pub(crate) async fn delete_link(
    State(state): State<Arc<AppState>>,
    Path(link_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Redirect, ServerError> {
    let conn = state.conn()?;
    repo::delete_link(&conn, link_id)?;
    tracing::info!(link_id, "Deleted link");
    Ok(redirect_back(&headers))
}
