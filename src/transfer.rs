//! Bulk data movement: JSON import, backup export, demo seeding.
//!
//! Two JSON shapes are understood:
//! - the legacy bookmark export, `{"<page>": {"<widget>": [[title, url, icon], ...]}}`,
//!   whose object key order is the display order;
//! - the structured [`Backup`] written by [`export_backup`].
//!
//! Every import runs in one transaction: a malformed file leaves the
//! database untouched.

use std::fmt;
use std::marker::PhantomData;

use rusqlite::Connection;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::db::DashError;
use crate::models::WidgetKind;
use crate::repo;
use crate::validation;

/// Format version written into every backup.
pub const BACKUP_VERSION: u32 = 1;

/// Counts of rows created by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub pages: usize,
    pub widgets: usize,
    pub links: usize,
}

/// A full snapshot of the dashboard in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub version: u32,
    pub exported_at: String,
    pub pages: Vec<PageExport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageExport {
    pub name: String,
    /// Informational; slugs are re-derived on import.
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub widgets: Vec<WidgetExport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetExport {
    pub title: String,
    #[serde(default)]
    pub kind: WidgetKind,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub links: Vec<LinkExport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkExport {
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub icon_url: String,
}

/// A JSON object read as a list of entries, keeping document order.
#[derive(Debug)]
struct Ordered<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Ordered<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = Ordered<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, V>()? {
                    entries.push(entry);
                }
                Ok(Ordered(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

/// `[title, url, icon]`; url and icon may be missing or null.
type LegacyLink = Vec<Option<String>>;
type LegacyExport = Ordered<Ordered<Vec<LegacyLink>>>;

/// Imports either JSON shape, detected from the document itself.
///
/// # Errors
/// Returns `DashError::Json` if the text is neither shape, and
/// `DashError::InvalidInput` for a backup with an unsupported version.
pub fn import_json(conn: &Connection, text: &str) -> Result<ImportSummary, DashError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if is_backup(&value) {
        let backup: Backup = serde_json::from_value(value)?;
        import_backup(conn, &backup)
    } else {
        import_legacy(conn, text)
    }
}

fn is_backup(value: &serde_json::Value) -> bool {
    value.get("version").is_some_and(serde_json::Value::is_u64)
        && value.get("pages").is_some_and(serde_json::Value::is_array)
}

/// Merges a legacy bookmark export into the dashboard.
///
/// Pages are matched by slug, widgets by title within their page, links by
/// URL within their widget; only the missing ones are created, so importing
/// the same file twice is a no-op the second time.
///
/// # Errors
/// Returns `DashError::InvalidInput`, importing nothing, if a name, title or
/// URL exceeds the stored length limits.
pub fn import_legacy(conn: &Connection, text: &str) -> Result<ImportSummary, DashError> {
    let export: LegacyExport = serde_json::from_str(text)?;
    let mut summary = ImportSummary::default();

    let tx = conn.unchecked_transaction()?;

    for (page_name, widgets) in export.0 {
        validation::validate_page_name(&page_name)?;
        let page = match repo::get_page_by_slug(&tx, &repo::base_slug(&page_name)) {
            Ok(page) => page,
            Err(DashError::NotFound(_)) => {
                summary.pages += 1;
                repo::insert_page(&tx, &page_name)?
            }
            Err(e) => return Err(e),
        };

        for (widget_title, links) in widgets.0 {
            validation::validate_widget_title(&widget_title)?;
            let widget = match repo::find_widget_by_title(&tx, page.id, &widget_title)? {
                Some(widget) => widget,
                None => {
                    summary.widgets += 1;
                    repo::insert_widget(&tx, page.id, &widget_title, WidgetKind::List)?
                }
            };

            for fields in links {
                let mut fields = fields.into_iter().map(Option::unwrap_or_default);
                let title = fields.next().unwrap_or_default();
                let url = fields.next().unwrap_or_default();
                let icon_url = fields.next().unwrap_or_default();
                if title.is_empty() {
                    tracing::warn!(widget = %widget_title, url = %url, "skipping link without a title");
                    continue;
                }
                validation::validate_link(&title, &url, &icon_url)?;
                if repo::find_link_by_url(&tx, widget.id, &url)?.is_none() {
                    repo::insert_link(&tx, widget.id, &title, &url, &icon_url)?;
                    summary.links += 1;
                }
            }
        }
    }

    tx.commit()?;

    tracing::info!(pages = summary.pages, widgets = summary.widgets, links = summary.links, "legacy import finished");
    Ok(summary)
}

/// Appends every page of a backup to the dashboard.
///
/// Page slugs are re-derived, so a page whose slug is already taken gets a
/// suffixed one.
///
/// # Errors
/// Returns `DashError::InvalidInput` if the backup version is newer than this
/// build understands or an entry exceeds the stored length limits.
pub fn import_backup(conn: &Connection, backup: &Backup) -> Result<ImportSummary, DashError> {
    if backup.version > BACKUP_VERSION {
        return Err(DashError::InvalidInput(format!(
            "Unsupported backup version {} (max {})",
            backup.version, BACKUP_VERSION
        )));
    }

    let mut summary = ImportSummary::default();
    let tx = conn.unchecked_transaction()?;

    for page_export in &backup.pages {
        validation::validate_page_name(&page_export.name)?;
        let page = repo::insert_page(&tx, &page_export.name)?;
        summary.pages += 1;

        for widget_export in &page_export.widgets {
            validation::validate_widget_title(&widget_export.title)?;
            validation::validate_note(&widget_export.content)?;
            let widget = repo::insert_widget(&tx, page.id, &widget_export.title, widget_export.kind)?;
            if !widget_export.content.is_empty() {
                repo::write_note_content(&tx, widget.id, &widget_export.content)?;
            }
            summary.widgets += 1;

            for link in &widget_export.links {
                validation::validate_link(&link.title, &link.url, &link.icon_url)?;
                repo::insert_link(&tx, widget.id, &link.title, &link.url, &link.icon_url)?;
                summary.links += 1;
            }
        }
    }

    tx.commit()?;

    tracing::info!(pages = summary.pages, widgets = summary.widgets, links = summary.links, "backup import finished");
    Ok(summary)
}

/// Snapshots the whole dashboard in display order.
pub fn export_backup(conn: &Connection) -> Result<Backup, DashError> {
    let mut pages = Vec::new();
    for page in repo::list_pages(conn)? {
        let tree = repo::load_page_tree(conn, page)?;
        pages.push(PageExport {
            name: tree.page.name,
            slug: tree.page.slug,
            widgets: tree
                .widgets
                .into_iter()
                .map(|w| WidgetExport {
                    title: w.widget.title,
                    kind: w.widget.kind,
                    content: w.widget.content,
                    links: w
                        .links
                        .into_iter()
                        .map(|l| LinkExport {
                            title: l.title,
                            url: l.url,
                            icon_url: l.icon_url,
                        })
                        .collect(),
                })
                .collect(),
        });
    }

    Ok(Backup {
        version: BACKUP_VERSION,
        exported_at: chrono::Utc::now().to_rfc3339(),
        pages,
    })
}

/// Demo pages: (page, [(widget, [(title, url)])]).
const DEMO_DATA: &[(&str, &[(&str, &[(&str, &str)])])] = &[
    (
        "Start Page",
        &[
            ("Shopping", &[("Costco", "https://costco.ca"), ("Amazon", "https://amazon.ca")]),
            ("Home", &[("Thermostat", "#"), ("Cameras", "#")]),
        ],
    ),
    (
        "News",
        &[
            ("Papers", &[("La Presse", "https://lapresse.ca"), ("Le Devoir", "https://ledevoir.com")]),
            ("Tech", &[("Hacker News", "https://news.ycombinator.com"), ("LWN", "https://lwn.net")]),
        ],
    ),
    (
        "Programming",
        &[
            ("Dev", &[("GitHub", "https://github.com"), ("Stack Overflow", "https://stackoverflow.com")]),
            ("Rust", &[("Docs", "https://doc.rust-lang.org"), ("crates.io", "https://crates.io")]),
        ],
    ),
];

/// Replaces all data with a small demo dashboard.
pub fn seed_demo(conn: &Connection) -> Result<ImportSummary, DashError> {
    let mut summary = ImportSummary::default();
    let tx = conn.unchecked_transaction()?;

    let removed = repo::delete_all_pages(&tx)?;
    for (page_name, widgets) in DEMO_DATA {
        let page = repo::insert_page(&tx, page_name)?;
        summary.pages += 1;
        for (widget_title, links) in *widgets {
            let widget = repo::insert_widget(&tx, page.id, widget_title, WidgetKind::List)?;
            summary.widgets += 1;
            for (title, url) in *links {
                repo::insert_link(&tx, widget.id, title, url, "")?;
                summary.links += 1;
            }
        }
    }

    tx.commit()?;

    tracing::info!(removed, pages = summary.pages, "seeded demo data");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    const LEGACY: &str = r#"{
        "Zulu Page": {
            "Zeta": [["Second", "https://b", "https://b/icon.png"], ["First", "https://a"]],
            "Alpha": [["Only", "https://o", null]]
        },
        "Alpha Page": {}
    }"#;

    fn setup_test_db() -> Connection {
        db::open_in_memory().expect("Failed to create in-memory database")
    }

    #[test]
    fn test_import_legacy_preserves_document_order() {
        let conn = setup_test_db();

        let summary = import_legacy(&conn, LEGACY).expect("import");
        assert_eq!(summary, ImportSummary { pages: 2, widgets: 2, links: 3 });

        let pages = repo::list_pages(&conn).expect("pages");
        let slugs: Vec<&str> = pages.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["zulu-page", "alpha-page"]);

        let widgets = repo::list_widgets(&conn, pages[0].id).expect("widgets");
        let titles: Vec<&str> = widgets.iter().map(|w| w.title.as_str()).collect();
        assert_eq!(titles, vec!["Zeta", "Alpha"]);

        let links = repo::list_links(&conn, widgets[0].id).expect("links");
        assert_eq!(links[0].title, "Second");
        assert_eq!(links[0].icon_url, "https://b/icon.png");
        assert_eq!(links[1].title, "First");
        assert_eq!(links[1].icon_url, "");
    }

    #[test]
    fn test_import_legacy_is_idempotent() {
        let conn = setup_test_db();

        import_legacy(&conn, LEGACY).expect("first import");
        let second = import_legacy(&conn, LEGACY).expect("second import");
        assert_eq!(second, ImportSummary::default());
        assert_eq!(repo::list_pages(&conn).expect("pages").len(), 2);
    }

    #[test]
    fn test_import_legacy_merges_into_existing_page() {
        let conn = setup_test_db();

        let page = repo::create_page(&conn, "Zulu Page").expect("page");
        let widget = repo::create_widget(&conn, page.id, "Zeta", WidgetKind::List).expect("widget");
        repo::create_link(&conn, widget.id, "Already", "https://a", "").expect("link");

        let summary = import_legacy(&conn, LEGACY).expect("import");
        assert_eq!(summary, ImportSummary { pages: 1, widgets: 1, links: 2 });
        let titles: Vec<String> = repo::list_links(&conn, widget.id)
            .expect("links")
            .into_iter()
            .map(|l| l.title)
            .collect();
        assert_eq!(titles, vec!["Already", "Second"]);
    }

    #[test]
    fn test_import_legacy_skips_untitled_links() {
        let conn = setup_test_db();

        let summary = import_legacy(&conn, r#"{"P": {"W": [[], [null, "https://x"], ["Ok", "https://y"]]}}"#)
            .expect("import");
        assert_eq!(summary.links, 1);
    }

    #[test]
    fn test_import_legacy_unsluggable_page_is_idempotent() {
        let conn = setup_test_db();
        let text = r#"{"日本": {"W": [["A", "https://a"]]}}"#;

        let first = import_legacy(&conn, text).expect("first import");
        assert_eq!(first, ImportSummary { pages: 1, widgets: 1, links: 1 });

        let second = import_legacy(&conn, text).expect("second import");
        assert_eq!(second, ImportSummary::default());

        let pages = repo::list_pages(&conn).expect("pages");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].slug, "page");
    }

    #[test]
    fn test_import_legacy_rejects_oversized_entries() {
        let conn = setup_test_db();

        let long_name = format!(r#"{{"{}": {{}}}}"#, "x".repeat(101));
        assert!(matches!(import_legacy(&conn, &long_name), Err(DashError::InvalidInput(_))));

        let long_url = format!(r#"{{"P": {{"W": [["Ok", "{}"]]}}}}"#, "u".repeat(2049));
        assert!(matches!(import_legacy(&conn, &long_url), Err(DashError::InvalidInput(_))));

        assert!(repo::list_pages(&conn).expect("pages").is_empty());
    }

    #[test]
    fn test_import_backup_rejects_oversized_entries() {
        let conn = setup_test_db();

        let backup = Backup {
            version: BACKUP_VERSION,
            exported_at: String::new(),
            pages: vec![
                PageExport {
                    name: "Fine".to_string(),
                    slug: String::new(),
                    widgets: vec![],
                },
                PageExport {
                    name: "x".repeat(500),
                    slug: String::new(),
                    widgets: vec![],
                },
            ],
        };
        assert!(matches!(import_backup(&conn, &backup), Err(DashError::InvalidInput(_))));
        assert!(repo::list_pages(&conn).expect("pages").is_empty());

        let backup = Backup {
            version: BACKUP_VERSION,
            exported_at: String::new(),
            pages: vec![PageExport {
                name: "Work".to_string(),
                slug: String::new(),
                widgets: vec![WidgetExport {
                    title: "Scratch".to_string(),
                    kind: WidgetKind::Note,
                    content: String::new(),
                    links: vec![LinkExport {
                        title: "t".repeat(201),
                        url: String::new(),
                        icon_url: String::new(),
                    }],
                }],
            }],
        };
        assert!(matches!(import_backup(&conn, &backup), Err(DashError::InvalidInput(_))));
        assert!(repo::list_pages(&conn).expect("pages").is_empty());
    }

    #[test]
    fn test_import_malformed_leaves_database_untouched() {
        let conn = setup_test_db();

        let result = import_json(&conn, r#"{"P": {"W": "not a list"}}"#);
        assert!(matches!(result, Err(DashError::Json(_))));
        assert!(repo::list_pages(&conn).expect("pages").is_empty());

        assert!(import_json(&conn, "not json").is_err());
    }

    #[test]
    fn test_export_then_import_reproduces_tree() {
        let source = setup_test_db();
        let page = repo::create_page(&source, "Work").expect("page");
        let tools = repo::create_widget(&source, page.id, "Tools", WidgetKind::List).expect("widget");
        let note = repo::create_widget(&source, page.id, "Scratch", WidgetKind::Note).expect("widget");
        repo::set_widget_note_content(&source, note.id, "remember").expect("note");
        let a = repo::create_link(&source, tools.id, "Docs", "https://x", "").expect("link");
        let b = repo::create_link(&source, tools.id, "Repo", "https://y", "https://y/i.png").expect("link");
        repo::reorder_links(&source, tools.id, &[b.id, a.id]).expect("reorder");
        repo::create_page(&source, "Home").expect("page");

        let backup = export_backup(&source).expect("export");
        assert_eq!(backup.version, BACKUP_VERSION);
        let text = serde_json::to_string(&backup).expect("serialize");

        let target = setup_test_db();
        let summary = import_json(&target, &text).expect("import");
        assert_eq!(summary, ImportSummary { pages: 2, widgets: 2, links: 2 });

        let again = export_backup(&target).expect("export");
        assert_eq!(again.pages, backup.pages);
        assert_eq!(again.pages[0].widgets[0].links[0].title, "Repo");
        assert_eq!(again.pages[0].widgets[1].content, "remember");
    }

    #[test]
    fn test_import_backup_rejects_future_version() {
        let conn = setup_test_db();

        let backup = Backup {
            version: BACKUP_VERSION + 1,
            exported_at: String::new(),
            pages: vec![],
        };
        assert!(matches!(import_backup(&conn, &backup), Err(DashError::InvalidInput(_))));
    }

    #[test]
    fn test_seed_demo_replaces_everything() {
        let conn = setup_test_db();

        repo::create_page(&conn, "Mine").expect("page");
        let summary = seed_demo(&conn).expect("seed");
        assert_eq!(summary, ImportSummary { pages: 3, widgets: 6, links: 12 });

        let pages = repo::list_pages(&conn).expect("pages");
        let slugs: Vec<&str> = pages.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["start-page", "news", "programming"]);

        seed_demo(&conn).expect("seed again");
        assert_eq!(repo::list_pages(&conn).expect("pages").len(), 3);
    }
}
