//! Core data structures for the dashboard.
//!
//! These structs are the shared language between the repository layer (SQL),
//! the HTTP handlers, and the output layer (serde_json). They are kept
//! simple: plain data, no business logic beyond slug derivation.

use serde::{Deserialize, Serialize};

/// A top-level tab of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub id: i64,
    pub name: String,
    /// Globally unique, URL-safe identifier derived from `name`.
    pub slug: String,
    pub order: i64,
}

/// A category block on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Widget {
    pub id: i64,
    pub page_id: i64,
    pub title: String,
    pub kind: WidgetKind,
    /// Free text, only meaningful for `WidgetKind::Note`. Empty otherwise.
    pub content: String,
    pub order: i64,
}

/// What a widget displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetKind {
    /// An ordered list of links.
    #[default]
    List,
    /// A free-text notepad.
    Note,
    /// A list of shell commands to launch.
    Command,
}

impl WidgetKind {
    /// Parse from a form or CLI string. Returns None for unrecognized kinds.
    ///
    /// Accepts both the stored names and the long forms a front end may send.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "list" | "link-list" => Some(Self::List),
            "note" => Some(Self::Note),
            "command" | "command-launcher" => Some(Self::Command),
            _ => None,
        }
    }

    /// The string stored in SQLite and displayed in output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Note => "note",
            Self::Command => "command",
        }
    }
}

impl std::fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bookmark inside a widget. `url` may hold a web URL, a local filesystem
/// path, or a shell command string, and may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub id: i64,
    pub widget_id: i64,
    pub title: String,
    pub url: String,
    pub icon_url: String,
    pub order: i64,
}

/// A widget with its links, in display order.
#[derive(Debug, Clone, Serialize)]
pub struct WidgetTree {
    #[serde(flatten)]
    pub widget: Widget,
    pub links: Vec<Link>,
}

/// A page with its widgets and their links, in display order.
#[derive(Debug, Clone, Serialize)]
pub struct PageTree {
    #[serde(flatten)]
    pub page: Page,
    pub widgets: Vec<WidgetTree>,
}

/// Everything the dashboard view needs: the tab bar and the active tab.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub pages: Vec<Page>,
    pub active_page: Option<PageTree>,
}

/// Derive a URL-safe slug from a display name.
///
/// Accented Latin letters are folded to ASCII, other non-ASCII characters and
/// punctuation are dropped, whitespace and hyphen runs collapse to a single
/// `-`, and leading/trailing `-`/`_` are trimmed. May return an empty string.
pub fn slugify(name: &str) -> String {
    let mut folded = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii() {
            folded.push(c);
        } else if let Some(ascii) = fold_latin(c) {
            folded.push_str(ascii);
        }
    }

    let mut slug = String::with_capacity(folded.len());
    let mut pending_dash = false;
    for c in folded.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c == '-' || c.is_ascii_whitespace() {
            pending_dash = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// ASCII replacement for common accented Latin characters.
fn fold_latin(c: char) -> Option<&'static str> {
    let ascii = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "A",
        'æ' => "ae",
        'Æ' => "AE",
        'ç' => "c",
        'Ç' => "C",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'È' | 'É' | 'Ê' | 'Ë' => "E",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'Ì' | 'Í' | 'Î' | 'Ï' => "I",
        'ñ' => "n",
        'Ñ' => "N",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => "o",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => "O",
        'œ' => "oe",
        'Œ' => "OE",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'Ù' | 'Ú' | 'Û' | 'Ü' => "U",
        'ý' | 'ÿ' => "y",
        'Ý' => "Y",
        _ => return None,
    };
    Some(ascii)
}
