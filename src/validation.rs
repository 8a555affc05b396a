//! Input validation shared by the CLI and the HTTP handlers.
//!
//! Empty names and titles are not errors here: callers treat them as "do
//! nothing" before validating. These checks only bound what gets stored.

use crate::db::DashError;

pub const MAX_PAGE_NAME_LEN: usize = 100;
pub const MAX_WIDGET_TITLE_LEN: usize = 100;
pub const MAX_LINK_TITLE_LEN: usize = 200;
pub const MAX_URL_LEN: usize = 2048;
pub const MAX_NOTE_LEN: usize = 1_000_000; // 1 MB

fn check_len(what: &str, value: &str, max: usize) -> Result<(), DashError> {
    if value.chars().count() > max {
        return Err(DashError::InvalidInput(format!("{} too long (max {} characters)", what, max)));
    }
    Ok(())
}

pub fn validate_page_name(name: &str) -> Result<(), DashError> {
    check_len("Page name", name, MAX_PAGE_NAME_LEN)
}

pub fn validate_widget_title(title: &str) -> Result<(), DashError> {
    check_len("Widget title", title, MAX_WIDGET_TITLE_LEN)
}

pub fn validate_link(title: &str, url: &str, icon_url: &str) -> Result<(), DashError> {
    check_len("Link title", title, MAX_LINK_TITLE_LEN)?;
    check_len("URL", url, MAX_URL_LEN)?;
    check_len("Icon URL", icon_url, MAX_URL_LEN)
}

pub fn validate_note(content: &str) -> Result<(), DashError> {
    if content.len() > MAX_NOTE_LEN {
        return Err(DashError::InvalidInput(format!("Note too long (max {} bytes)", MAX_NOTE_LEN)));
    }
    Ok(())
}
