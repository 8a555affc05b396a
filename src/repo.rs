//! Repository layer: the ordered tree of pages, widgets and links.
//!
//! This module provides plain functions that execute SQL statements using
//! `rusqlite::Connection`. Each function takes a database connection as its
//! first parameter and returns a `Result<T, DashError>`.
//!
//! Every mutation runs inside a single transaction so a concurrent reader
//! never observes a half-applied reorder or move. Single-entity operations
//! fail with `DashError::NotFound` on an unknown id; batch reorders skip
//! unknown ids instead.

use crate::db::DashError;
use crate::models::{slugify, Dashboard, Link, Page, PageTree, Widget, WidgetKind, WidgetTree};
use rusqlite::{Connection, OptionalExtension};

const PAGE_COLUMNS: &str = "id, name, slug, sort_order";
const WIDGET_COLUMNS: &str = "id, page_id, title, kind, content, sort_order";
const LINK_COLUMNS: &str = "id, widget_id, title, url, icon_url, sort_order";

/// Slug used when a page name contains nothing slug-worthy.
const FALLBACK_SLUG: &str = "page";

/// Map a rusqlite Row to a Page struct.
/// Expects columns in order: id, name, slug, sort_order
fn row_to_page(row: &rusqlite::Row) -> Result<Page, rusqlite::Error> {
    Ok(Page {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        order: row.get(3)?,
    })
}

/// Map a rusqlite Row to a Widget struct.
/// Expects columns in order: id, page_id, title, kind, content, sort_order
fn row_to_widget(row: &rusqlite::Row) -> Result<Widget, rusqlite::Error> {
    let kind_str: String = row.get(3)?;
    let kind = WidgetKind::from_str(&kind_str)
        .ok_or_else(|| rusqlite::Error::InvalidColumnType(3, "kind".to_string(), rusqlite::types::Type::Text))?;
    Ok(Widget {
        id: row.get(0)?,
        page_id: row.get(1)?,
        title: row.get(2)?,
        kind,
        content: row.get(4)?,
        order: row.get(5)?,
    })
}

/// Map a rusqlite Row to a Link struct.
/// Expects columns in order: id, widget_id, title, url, icon_url, sort_order
fn row_to_link(row: &rusqlite::Row) -> Result<Link, rusqlite::Error> {
    Ok(Link {
        id: row.get(0)?,
        widget_id: row.get(1)?,
        title: row.get(2)?,
        url: row.get(3)?,
        icon_url: row.get(4)?,
        order: row.get(5)?,
    })
}

fn missing(e: rusqlite::Error, what: String) -> DashError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => DashError::NotFound(what),
        _ => DashError::Db(e),
    }
}

// =============================================================================
// Pages
// =============================================================================

/// Returns true if another page already uses `slug`.
fn slug_taken(conn: &Connection, slug: &str, exclude_id: Option<i64>) -> Result<bool, DashError> {
    let taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM pages WHERE slug = ?1 AND id IS NOT ?2)",
        rusqlite::params![slug, exclude_id],
        |row| row.get(0),
    )?;
    Ok(taken)
}

/// The slug a page named `name` gets before collision suffixes.
pub(crate) fn base_slug(name: &str) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Derives a slug from `name` that no other page uses, suffixing `-1`, `-2`,
/// … on collision. `exclude_id` is the page being renamed, whose own slug
/// never counts as a collision.
fn unique_slug(conn: &Connection, name: &str, exclude_id: Option<i64>) -> Result<String, DashError> {
    let base = base_slug(name);
    let mut slug = base.clone();
    let mut counter = 1;
    while slug_taken(conn, &slug, exclude_id)? {
        slug = format!("{}-{}", base, counter);
        counter += 1;
    }
    Ok(slug)
}

fn next_page_order(conn: &Connection) -> Result<i64, DashError> {
    let order = conn.query_row("SELECT COALESCE(MAX(sort_order) + 1, 0) FROM pages", [], |row| row.get(0))?;
    Ok(order)
}

/// Creates a new page at the end of the tab bar.
///
/// # Arguments
/// * `conn` - Database connection
/// * `name` - Display name; the slug is derived from it
///
/// # Returns
/// The newly created page
pub fn create_page(conn: &Connection, name: &str) -> Result<Page, DashError> {
    let tx = conn.unchecked_transaction()?;
    let page = insert_page(&tx, name)?;
    tx.commit()?;
    Ok(page)
}

/// Inserts a page without opening a transaction of its own.
///
/// For callers that batch several inserts into one transaction.
pub(crate) fn insert_page(conn: &Connection, name: &str) -> Result<Page, DashError> {
    let slug = unique_slug(conn, name, None)?;
    let order = next_page_order(conn)?;
    conn.execute(
        "INSERT INTO pages (name, slug, sort_order) VALUES (?1, ?2, ?3)",
        rusqlite::params![name, slug, order],
    )?;

    Ok(Page {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        slug,
        order,
    })
}

/// Retrieves a page by its ID.
///
/// # Errors
/// Returns `DashError::NotFound` if no page with the given ID exists.
pub fn get_page(conn: &Connection, id: i64) -> Result<Page, DashError> {
    conn.query_row(
        &format!("SELECT {PAGE_COLUMNS} FROM pages WHERE id = ?1"),
        [id],
        row_to_page,
    )
    .map_err(|e| missing(e, format!("Page with ID {} not found", id)))
}

/// Retrieves a page by its slug.
///
/// # Errors
/// Returns `DashError::NotFound` if no page with the given slug exists.
pub fn get_page_by_slug(conn: &Connection, slug: &str) -> Result<Page, DashError> {
    conn.query_row(
        &format!("SELECT {PAGE_COLUMNS} FROM pages WHERE slug = ?1"),
        [slug],
        row_to_page,
    )
    .map_err(|e| missing(e, format!("Page with slug '{}' not found", slug)))
}

/// Returns the first page of the tab bar, if any.
pub fn first_page(conn: &Connection) -> Result<Option<Page>, DashError> {
    let page = conn
        .query_row(
            &format!("SELECT {PAGE_COLUMNS} FROM pages ORDER BY sort_order, id LIMIT 1"),
            [],
            row_to_page,
        )
        .optional()?;
    Ok(page)
}

/// Lists all pages in display order.
pub fn list_pages(conn: &Connection) -> Result<Vec<Page>, DashError> {
    let mut stmt = conn.prepare(&format!("SELECT {PAGE_COLUMNS} FROM pages ORDER BY sort_order, id"))?;
    let pages = stmt
        .query_map([], row_to_page)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(pages)
}

/// Renames a page and re-derives its slug.
///
/// The slug goes through the same collision avoidance as `create_page`, but
/// the page's own current slug is not a collision: renaming a page to its
/// current name keeps its slug.
///
/// # Errors
/// Returns `DashError::NotFound` if the page doesn't exist.
pub fn rename_page(conn: &Connection, id: i64, new_name: &str) -> Result<Page, DashError> {
    let tx = conn.unchecked_transaction()?;

    let page = get_page(&tx, id)?;
    let slug = unique_slug(&tx, new_name, Some(id))?;
    tx.execute(
        "UPDATE pages SET name = ?1, slug = ?2 WHERE id = ?3",
        rusqlite::params![new_name, slug, id],
    )?;

    tx.commit()?;

    Ok(Page {
        name: new_name.to_string(),
        slug,
        ..page
    })
}

/// Deletes a page together with its widgets and their links (via CASCADE).
///
/// # Errors
/// Returns `DashError::NotFound` if the page doesn't exist.
pub fn delete_page(conn: &Connection, id: i64) -> Result<(), DashError> {
    let rows_affected = conn.execute("DELETE FROM pages WHERE id = ?1", [id])?;
    if rows_affected == 0 {
        return Err(DashError::NotFound(format!("Page with ID {} not found", id)));
    }
    Ok(())
}

/// Deletes every page (and, through CASCADE, every widget and link).
///
/// Returns the number of pages removed.
pub fn delete_all_pages(conn: &Connection) -> Result<usize, DashError> {
    Ok(conn.execute("DELETE FROM pages", [])?)
}

/// Sets each page's order to its position in `ordered_ids`.
///
/// Unknown ids are skipped. Returns the number of pages updated.
pub fn reorder_pages(conn: &Connection, ordered_ids: &[i64]) -> Result<usize, DashError> {
    let tx = conn.unchecked_transaction()?;

    let mut updated = 0;
    {
        let mut stmt = tx.prepare("UPDATE pages SET sort_order = ?1 WHERE id = ?2")?;
        for (position, id) in ordered_ids.iter().enumerate() {
            updated += stmt.execute(rusqlite::params![position as i64, id])?;
        }
    }

    tx.commit()?;
    Ok(updated)
}

// =============================================================================
// Widgets
// =============================================================================

fn next_widget_order(conn: &Connection, page_id: i64) -> Result<i64, DashError> {
    let order = conn.query_row(
        "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM widgets WHERE page_id = ?1",
        [page_id],
        |row| row.get(0),
    )?;
    Ok(order)
}

/// Creates a widget at the end of a page.
///
/// # Errors
/// Returns `DashError::NotFound` if the page doesn't exist.
pub fn create_widget(conn: &Connection, page_id: i64, title: &str, kind: WidgetKind) -> Result<Widget, DashError> {
    let tx = conn.unchecked_transaction()?;
    get_page(&tx, page_id)?;
    let widget = insert_widget(&tx, page_id, title, kind)?;
    tx.commit()?;
    Ok(widget)
}

/// Inserts a widget at the end of a page without opening a transaction.
pub(crate) fn insert_widget(conn: &Connection, page_id: i64, title: &str, kind: WidgetKind) -> Result<Widget, DashError> {
    let order = next_widget_order(conn, page_id)?;
    conn.execute(
        "INSERT INTO widgets (page_id, title, kind, content, sort_order) VALUES (?1, ?2, ?3, '', ?4)",
        rusqlite::params![page_id, title, kind.as_str(), order],
    )?;

    Ok(Widget {
        id: conn.last_insert_rowid(),
        page_id,
        title: title.to_string(),
        kind,
        content: String::new(),
        order,
    })
}

/// Retrieves a widget by its ID.
///
/// # Errors
/// Returns `DashError::NotFound` if no widget with the given ID exists.
pub fn get_widget(conn: &Connection, id: i64) -> Result<Widget, DashError> {
    conn.query_row(
        &format!("SELECT {WIDGET_COLUMNS} FROM widgets WHERE id = ?1"),
        [id],
        row_to_widget,
    )
    .map_err(|e| missing(e, format!("Widget with ID {} not found", id)))
}

/// Lists the widgets of a page in display order.
pub fn list_widgets(conn: &Connection, page_id: i64) -> Result<Vec<Widget>, DashError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {WIDGET_COLUMNS} FROM widgets WHERE page_id = ?1 ORDER BY sort_order, id"
    ))?;
    let widgets = stmt
        .query_map([page_id], row_to_widget)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(widgets)
}

/// The widget a page displays first: lowest order, ties broken by lowest id.
pub fn first_widget(conn: &Connection, page_id: i64) -> Result<Option<Widget>, DashError> {
    let widget = conn
        .query_row(
            &format!("SELECT {WIDGET_COLUMNS} FROM widgets WHERE page_id = ?1 ORDER BY sort_order, id LIMIT 1"),
            [page_id],
            row_to_widget,
        )
        .optional()?;
    Ok(widget)
}

/// Finds a widget on a page by exact title.
pub fn find_widget_by_title(conn: &Connection, page_id: i64, title: &str) -> Result<Option<Widget>, DashError> {
    let widget = conn
        .query_row(
            &format!("SELECT {WIDGET_COLUMNS} FROM widgets WHERE page_id = ?1 AND title = ?2 ORDER BY sort_order, id LIMIT 1"),
            rusqlite::params![page_id, title],
            row_to_widget,
        )
        .optional()?;
    Ok(widget)
}

/// Changes a widget's title.
///
/// # Errors
/// Returns `DashError::NotFound` if the widget doesn't exist.
pub fn rename_widget(conn: &Connection, id: i64, new_title: &str) -> Result<Widget, DashError> {
    let tx = conn.unchecked_transaction()?;

    let rows_affected = tx.execute(
        "UPDATE widgets SET title = ?1 WHERE id = ?2",
        rusqlite::params![new_title, id],
    )?;
    if rows_affected == 0 {
        return Err(DashError::NotFound(format!("Widget with ID {} not found", id)));
    }
    let widget = get_widget(&tx, id)?;

    tx.commit()?;
    Ok(widget)
}

/// Replaces a widget's note content. Allowed on any kind of widget.
///
/// # Errors
/// Returns `DashError::NotFound` if the widget doesn't exist.
pub fn set_widget_note_content(conn: &Connection, id: i64, content: &str) -> Result<Widget, DashError> {
    let tx = conn.unchecked_transaction()?;
    write_note_content(&tx, id, content)?;
    let widget = get_widget(&tx, id)?;
    tx.commit()?;
    Ok(widget)
}

/// Replaces a widget's note content without opening a transaction.
pub(crate) fn write_note_content(conn: &Connection, id: i64, content: &str) -> Result<(), DashError> {
    let rows_affected = conn.execute(
        "UPDATE widgets SET content = ?1 WHERE id = ?2",
        rusqlite::params![content, id],
    )?;
    if rows_affected == 0 {
        return Err(DashError::NotFound(format!("Widget with ID {} not found", id)));
    }
    Ok(())
}

/// Deletes a widget and its links (via CASCADE).
///
/// # Errors
/// Returns `DashError::NotFound` if the widget doesn't exist.
pub fn delete_widget(conn: &Connection, id: i64) -> Result<(), DashError> {
    let rows_affected = conn.execute("DELETE FROM widgets WHERE id = ?1", [id])?;
    if rows_affected == 0 {
        return Err(DashError::NotFound(format!("Widget with ID {} not found", id)));
    }
    Ok(())
}

/// Sets each widget's order to its position in `ordered_ids`.
///
/// Only widgets that belong to `page_id` are touched; unknown ids and ids of
/// widgets on other pages are skipped. Returns the number of widgets updated.
///
/// # Errors
/// Returns `DashError::NotFound` if the page doesn't exist.
pub fn reorder_widgets(conn: &Connection, page_id: i64, ordered_ids: &[i64]) -> Result<usize, DashError> {
    let tx = conn.unchecked_transaction()?;

    get_page(&tx, page_id)?;
    let mut updated = 0;
    {
        let mut stmt = tx.prepare("UPDATE widgets SET sort_order = ?1 WHERE id = ?2 AND page_id = ?3")?;
        for (position, id) in ordered_ids.iter().enumerate() {
            updated += stmt.execute(rusqlite::params![position as i64, id, page_id])?;
        }
    }

    tx.commit()?;
    Ok(updated)
}

/// Moves a widget (with its links) to the end of another page.
///
/// # Errors
/// Returns `DashError::NotFound` if the widget or the target page doesn't exist.
pub fn move_widget_to_page(conn: &Connection, widget_id: i64, target_page_id: i64) -> Result<Widget, DashError> {
    let tx = conn.unchecked_transaction()?;

    let widget = get_widget(&tx, widget_id)?;
    get_page(&tx, target_page_id)?;
    let order = next_widget_order(&tx, target_page_id)?;
    tx.execute(
        "UPDATE widgets SET page_id = ?1, sort_order = ?2 WHERE id = ?3",
        rusqlite::params![target_page_id, order, widget_id],
    )?;

    tx.commit()?;

    Ok(Widget {
        page_id: target_page_id,
        order,
        ..widget
    })
}

// =============================================================================
// Links
// =============================================================================

fn next_link_order(conn: &Connection, widget_id: i64) -> Result<i64, DashError> {
    let order = conn.query_row(
        "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM links WHERE widget_id = ?1",
        [widget_id],
        |row| row.get(0),
    )?;
    Ok(order)
}

/// Creates a link at the end of a widget.
///
/// # Arguments
/// * `conn` - Database connection
/// * `widget_id` - Parent widget
/// * `title` - Display text (required by callers, not checked here)
/// * `url` - Web URL, local path or shell command; may be empty
/// * `icon_url` - Optional icon, empty when unset
///
/// # Errors
/// Returns `DashError::NotFound` if the widget doesn't exist.
pub fn create_link(
    conn: &Connection,
    widget_id: i64,
    title: &str,
    url: &str,
    icon_url: &str,
) -> Result<Link, DashError> {
    let tx = conn.unchecked_transaction()?;
    get_widget(&tx, widget_id)?;
    let link = insert_link(&tx, widget_id, title, url, icon_url)?;
    tx.commit()?;
    Ok(link)
}

/// Inserts a link at the end of a widget without opening a transaction.
pub(crate) fn insert_link(
    conn: &Connection,
    widget_id: i64,
    title: &str,
    url: &str,
    icon_url: &str,
) -> Result<Link, DashError> {
    let order = next_link_order(conn, widget_id)?;
    conn.execute(
        "INSERT INTO links (widget_id, title, url, icon_url, sort_order) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![widget_id, title, url, icon_url, order],
    )?;

    Ok(Link {
        id: conn.last_insert_rowid(),
        widget_id,
        title: title.to_string(),
        url: url.to_string(),
        icon_url: icon_url.to_string(),
        order,
    })
}

/// Retrieves a link by its ID.
///
/// # Errors
/// Returns `DashError::NotFound` if no link with the given ID exists.
pub fn get_link(conn: &Connection, id: i64) -> Result<Link, DashError> {
    conn.query_row(
        &format!("SELECT {LINK_COLUMNS} FROM links WHERE id = ?1"),
        [id],
        row_to_link,
    )
    .map_err(|e| missing(e, format!("Link with ID {} not found", id)))
}

/// Lists the links of a widget in display order.
pub fn list_links(conn: &Connection, widget_id: i64) -> Result<Vec<Link>, DashError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LINK_COLUMNS} FROM links WHERE widget_id = ?1 ORDER BY sort_order, id"
    ))?;
    let links = stmt
        .query_map([widget_id], row_to_link)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(links)
}

/// Finds a link in a widget by exact URL.
pub fn find_link_by_url(conn: &Connection, widget_id: i64, url: &str) -> Result<Option<Link>, DashError> {
    let link = conn
        .query_row(
            &format!("SELECT {LINK_COLUMNS} FROM links WHERE widget_id = ?1 AND url = ?2 ORDER BY sort_order, id LIMIT 1"),
            rusqlite::params![widget_id, url],
            row_to_link,
        )
        .optional()?;
    Ok(link)
}

/// Updates a link's title and URL in place.
///
/// # Errors
/// Returns `DashError::NotFound` if the link doesn't exist.
pub fn rename_link(conn: &Connection, id: i64, new_title: &str, new_url: &str) -> Result<Link, DashError> {
    let tx = conn.unchecked_transaction()?;

    let rows_affected = tx.execute(
        "UPDATE links SET title = ?1, url = ?2 WHERE id = ?3",
        rusqlite::params![new_title, new_url, id],
    )?;
    if rows_affected == 0 {
        return Err(DashError::NotFound(format!("Link with ID {} not found", id)));
    }
    let link = get_link(&tx, id)?;

    tx.commit()?;
    Ok(link)
}

/// Deletes a link.
///
/// # Errors
/// Returns `DashError::NotFound` if the link doesn't exist.
pub fn delete_link(conn: &Connection, id: i64) -> Result<(), DashError> {
    let rows_affected = conn.execute("DELETE FROM links WHERE id = ?1", [id])?;
    if rows_affected == 0 {
        return Err(DashError::NotFound(format!("Link with ID {} not found", id)));
    }
    Ok(())
}

/// Makes `ordered_ids` the contents of `target_widget_id`, in that order.
///
/// Each known link is moved into the target widget and given its position in
/// the sequence as its order. This covers both reordering within a widget and
/// drag-and-drop moves across widgets. Unknown ids are skipped; links of the
/// target widget missing from the list are left untouched. Returns the number
/// of links updated.
///
/// # Errors
/// Returns `DashError::NotFound` if the target widget doesn't exist.
pub fn reorder_links(conn: &Connection, target_widget_id: i64, ordered_ids: &[i64]) -> Result<usize, DashError> {
    let tx = conn.unchecked_transaction()?;

    get_widget(&tx, target_widget_id)?;
    let mut updated = 0;
    {
        let mut stmt = tx.prepare("UPDATE links SET widget_id = ?1, sort_order = ?2 WHERE id = ?3")?;
        for (position, id) in ordered_ids.iter().enumerate() {
            updated += stmt.execute(rusqlite::params![target_widget_id, position as i64, id])?;
        }
    }

    tx.commit()?;
    Ok(updated)
}

/// Moves a link to the first widget of another page, appending it there.
///
/// # Errors
/// Returns `DashError::NotFound` if the link or page doesn't exist, and
/// `DashError::NoTarget` (leaving the link where it was) if the page has no
/// widgets.
pub fn move_link_to_page(conn: &Connection, link_id: i64, target_page_id: i64) -> Result<Link, DashError> {
    let tx = conn.unchecked_transaction()?;

    let link = get_link(&tx, link_id)?;
    let page = get_page(&tx, target_page_id)?;
    let target = first_widget(&tx, page.id)?
        .ok_or_else(|| DashError::NoTarget(format!("Page '{}' has no widgets", page.slug)))?;
    let order = next_link_order(&tx, target.id)?;
    tx.execute(
        "UPDATE links SET widget_id = ?1, sort_order = ?2 WHERE id = ?3",
        rusqlite::params![target.id, order, link_id],
    )?;

    tx.commit()?;

    Ok(Link {
        widget_id: target.id,
        order,
        ..link
    })
}

// =============================================================================
// Tree views
// =============================================================================

/// Loads a page's widgets and their links, all in display order.
pub fn load_page_tree(conn: &Connection, page: Page) -> Result<PageTree, DashError> {
    let mut widgets = Vec::new();
    for widget in list_widgets(conn, page.id)? {
        let links = list_links(conn, widget.id)?;
        widgets.push(WidgetTree { widget, links });
    }
    Ok(PageTree { page, widgets })
}

/// Loads the tab bar and the active page.
///
/// With no slug the first page is active (none when the dashboard is empty).
///
/// # Errors
/// Returns `DashError::NotFound` if `slug` names no page.
pub fn load_dashboard(conn: &Connection, slug: Option<&str>) -> Result<Dashboard, DashError> {
    let active = match slug {
        Some(s) => Some(get_page_by_slug(conn, s)?),
        None => first_page(conn)?,
    };
    let active_page = match active {
        Some(page) => Some(load_page_tree(conn, page)?),
        None => None,
    };
    Ok(Dashboard {
        pages: list_pages(conn)?,
        active_page,
    })
}

// =============================================================================
// Tests
// =============================================================================
