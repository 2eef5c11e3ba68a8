//! Cookie helpers for the platform's session cookies.

use std::collections::BTreeMap;

/// Parse cookies from `Set-Cookie` response headers.
///
/// Only the leading `name=value` pair of each header is kept; attributes such
/// as `Path` or `Expires` are dropped. Later headers win on duplicate names.
/// Cookies the server deletes (empty value) are skipped.
pub fn parse_set_cookies(headers: &reqwest::header::HeaderMap) -> BTreeMap<String, String> {
    let mut cookies = BTreeMap::new();

    for value in headers.get_all(reqwest::header::SET_COOKIE) {
        let Ok(cookie_str) = value.to_str() else {
            continue;
        };
        let Some(kv) = cookie_str.split(';').next() else {
            continue;
        };
        if let Some((name, value)) = kv.split_once('=') {
            let (name, value) = (name.trim(), value.trim());
            if !name.is_empty() && !value.is_empty() {
                cookies.insert(name.to_string(), value.to_string());
            }
        }
    }

    cookies
}

/// Render cookies as a `Cookie` request header value.
pub fn to_header_value(cookies: &BTreeMap<String, String>) -> String {
    cookies
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("; ")
}
