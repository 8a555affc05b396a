//! Dashboard views and page (tab) endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::Json;

use crate::models::Dashboard;
use crate::repo;
use crate::server::error::ServerError;
use crate::server::handlers::{non_empty, redirect_to_page, FormFields};
use crate::server::state::AppState;
use crate::validation;

/// Handle GET `/`: the first page is active.
pub(crate) async fn index(State(state): State<Arc<AppState>>) -> Result<Json<Dashboard>, ServerError> {
    let conn = state.conn()?;
    Ok(Json(repo::load_dashboard(&conn, None)?))
}

/// Handle GET `/page/{slug}`.
pub(crate) async fn show_page(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<Dashboard>, ServerError> {
    let conn = state.conn()?;
    Ok(Json(repo::load_dashboard(&conn, Some(&slug))?))
}

/// Handle POST `/page/create`.
pub(crate) async fn create_page(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Redirect, ServerError> {
    let form = FormFields::parse(&body)?;
    let Some(name) = non_empty(form.get("name")) else {
        return Ok(Redirect::to("/"));
    };
    validation::validate_page_name(name)?;

    let conn = state.conn()?;
    let page = repo::create_page(&conn, name)?;
    tracing::info!(page_id = page.id, slug = %page.slug, "Created page");
    Ok(redirect_to_page(&page.slug))
}

/// Handle POST `/page/rename/{page_id}`.
pub(crate) async fn rename_page(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<i64>,
    body: String,
) -> Result<Redirect, ServerError> {
    let form = FormFields::parse(&body)?;
    let conn = state.conn()?;
    let Some(name) = non_empty(form.get("name")) else {
        let page = repo::get_page(&conn, page_id)?;
        return Ok(redirect_to_page(&page.slug));
    };
    validation::validate_page_name(name)?;

    let page = repo::rename_page(&conn, page_id, name)?;
    tracing::info!(page_id, slug = %page.slug, "Renamed page");
    Ok(redirect_to_page(&page.slug))
}

/// Handle GET/POST `/page/delete/{page_id}`.
pub(crate) async fn delete_page(
    State(state): State<Arc<AppState>>,
    Path(page_id): Path<i64>,
) -> Result<Redirect, ServerError> {
    let conn = state.conn()?;
    repo::delete_page(&conn, page_id)?;
    tracing::info!(page_id, "Deleted page");
    Ok(Redirect::to("/"))
}
