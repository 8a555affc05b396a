//! HTTP request handlers.
//!
//! Form endpoints answer with a `303 See Other` redirect, API endpoints with
//! an empty `200`, views with JSON.

pub(crate) mod backup;
pub(crate) mod links;
pub(crate) mod order;
pub(crate) mod pages;
pub(crate) mod widgets;

use axum::http::{header, HeaderMap};
use axum::response::Redirect;

use crate::server::error::ServerError;

/// Redirect to the page the request came from, or `/`.
pub(crate) fn redirect_back(headers: &HeaderMap) -> Redirect {
    let target = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("/");
    Redirect::to(target)
}

/// Redirect to a page's view.
pub(crate) fn redirect_to_page(slug: &str) -> Redirect {
    Redirect::to(&format!("/page/{slug}"))
}

/// A trimmed, non-empty form value.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse an optional id field; blank or non-numeric values count as absent.
pub(crate) fn parse_id(value: Option<&str>) -> Option<i64> {
    non_empty(value).and_then(|v| v.parse().ok())
}

/// A decoded `application/x-www-form-urlencoded` body that keeps repeated
/// keys, as sent by drag-and-drop list serializers (`link=3&link=1`).
#[derive(Debug, Default)]
pub(crate) struct FormFields(Vec<(String, String)>);

impl FormFields {
    pub(crate) fn parse(body: &str) -> Result<Self, ServerError> {
        serde_urlencoded::from_str(body)
            .map(Self)
            .map_err(|e| ServerError::Form(e.to_string()))
    }

    /// First value for `key`.
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Every value for `key` (or `key[]`) parsed as an id, in body order.
    /// Values that are not integers are dropped like unknown ids.
    pub(crate) fn ids(&self, key: &str) -> Vec<i64> {
        let bracketed = format!("{key}[]");
        self.0
            .iter()
            .filter(|(k, _)| k == key || *k == bracketed)
            .filter_map(|(_, v)| v.trim().parse().ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::response::IntoResponse;

    #[test]
    fn test_form_fields_keep_repeated_keys_in_order() {
        let form = FormFields::parse("widget_id=4&link=3&link=1&link%5B%5D=9&link=x").expect("parse");
        assert_eq!(form.get("widget_id"), Some("4"));
        assert_eq!(form.ids("link"), vec![3, 1, 9]);
        assert!(form.ids("page").is_empty());
    }

    #[test]
    fn test_form_fields_empty_body() {
        let form = FormFields::parse("").expect("parse");
        assert_eq!(form.get("widget_id"), None);
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(Some(" 12 ")), Some(12));
        assert_eq!(parse_id(Some("")), None);
        assert_eq!(parse_id(Some("abc")), None);
        assert_eq!(parse_id(None), None);
    }

    #[test]
    fn test_redirect_back_uses_referer() {
        let mut headers = HeaderMap::new();
        let response = redirect_back(&headers).into_response();
        assert_eq!(response.headers()[header::LOCATION], "/");

        headers.insert(header::REFERER, HeaderValue::from_static("/page/work"));
        let response = redirect_back(&headers).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/page/work");
    }
}
