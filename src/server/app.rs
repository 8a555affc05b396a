//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::server::handlers;
use crate::server::state::AppState;

/// Create the application router.
///
/// # Arguments
///
/// * `state` - Shared application state
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let page_routes = Router::new()
        .route("/", get(handlers::pages::index))
        .route("/page/{slug}", get(handlers::pages::show_page))
        .route("/page/create", post(handlers::pages::create_page))
        .route("/page/rename/{page_id}", post(handlers::pages::rename_page))
        .route(
            "/page/delete/{page_id}",
            get(handlers::pages::delete_page).post(handlers::pages::delete_page),
        );

    let widget_routes = Router::new()
        .route("/widget/add/{page_id}", post(handlers::widgets::add_widget))
        .route(
            "/widget/{widget_id}/rename",
            get(handlers::widgets::rename_widget_form).post(handlers::widgets::rename_widget),
        )
        .route(
            "/widget/delete/{widget_id}",
            get(handlers::widgets::delete_widget).post(handlers::widgets::delete_widget),
        )
        .route("/widget/move/{widget_id}", post(handlers::widgets::move_widget))
        .route("/widget/save_note/{widget_id}", post(handlers::widgets::save_note));

    let link_routes = Router::new()
        .route("/link/add/{widget_id}", post(handlers::links::add_link))
        .route(
            "/link/{link_id}/edit",
            get(handlers::links::edit_link_form).post(handlers::links::edit_link),
        )
        .route(
            "/link/delete/{link_id}",
            get(handlers::links::delete_link).post(handlers::links::delete_link),
        );

    // Drag-and-drop and background saves
    let api_routes = Router::new()
        .route("/api/update-order", post(handlers::order::update_link_order))
        .route("/api/update-widget-order", post(handlers::order::update_widget_order))
        .route("/api/update-page-order", post(handlers::order::update_page_order))
        .route("/api/move-link/{link_id}", post(handlers::order::move_link))
        .route("/api/save-note/{widget_id}", post(handlers::widgets::save_note))
        .route("/api/backup", get(handlers::backup::download_backup));

    Router::new()
        .merge(page_routes)
        .merge(widget_routes)
        .merge(link_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
