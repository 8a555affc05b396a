//! Output formatting for the `startpage` CLI.
//!
//! This module provides two output modes:
//! - **JSON**: Compact machine-readable output (default)
//! - **Pretty**: Human-readable indented tree (enabled via `--pretty` flag)

use std::fmt::Write as _;

use crate::models::PageTree;
use crate::transfer::ImportSummary;
use serde::Serialize;

/// Output mode for CLI results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Compact JSON output.
    Json,
    /// Human-readable formatted output.
    Pretty,
}

/// Serialize a value to compact JSON and print to stdout.
///
/// # Panics
///
/// Panics if serialization fails, which should only happen if the type has a broken
/// `Serialize` implementation.
pub fn print_json<T: Serialize>(value: &T) {
    let json = serde_json::to_string(value).expect("failed to serialize to JSON");
    println!("{}", json);
}

/// Render one page as an indented tree.
///
/// Format:
/// ```text
/// Work (work)
///   [list] Tools
///     - Repo -> https://y
///     - Docs -> https://x
///   [note] Scratch
///     | buy milk
/// ```
pub fn format_tree(tree: &PageTree) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", tree.page.name, tree.page.slug);

    if tree.widgets.is_empty() {
        let _ = writeln!(out, "  (no widgets)");
    }
    for w in &tree.widgets {
        let _ = writeln!(out, "  [{}] {}", w.widget.kind, w.widget.title);
        for line in w.widget.content.lines() {
            let _ = writeln!(out, "    | {}", line);
        }
        for link in &w.links {
            if link.url.is_empty() {
                let _ = writeln!(out, "    - {}", link.title);
            } else {
                let _ = writeln!(out, "    - {} -> {}", link.title, link.url);
            }
        }
    }
    out
}

/// Print page trees separated by blank lines.
pub fn print_pretty_trees(trees: &[PageTree]) {
    if trees.is_empty() {
        println!("(no pages)");
        return;
    }
    for (i, tree) in trees.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print!("{}", format_tree(tree));
    }
}

/// Print the counts of an import or seed.
pub fn print_pretty_summary(summary: &ImportSummary) {
    println!(
        "Created {} page(s), {} widget(s), {} link(s)",
        summary.pages, summary.widgets, summary.links
    );
}

/// Generic output dispatcher that handles both JSON and Pretty modes.
///
/// # Example
///
/// ```ignore
/// print(mode, &pages, || print_pretty_pages(&pages));
/// ```
pub fn print<T: Serialize>(mode: OutputMode, value: &T, pretty_fn: impl FnOnce()) {
    match mode {
        OutputMode::Json => print_json(value),
        OutputMode::Pretty => pretty_fn(),
    }
}
