// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RFC-5988 `Link` header parsing for paginated discovery endpoints.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<([^>]*)>; *rel="(\w+)""#).expect("constant regex pattern is valid")
});

/// Parse a raw `Link` header into a rel → URL map.
pub fn parse_link_header(raw: &str) -> HashMap<String, String> {
    let mut output = HashMap::new();
    for chunk in raw.split(',') {
        if let Some(captures) = LINK_PATTERN.captures(chunk.trim()) {
            output.insert(captures[2].to_string(), captures[1].to_string());
        }
    }
    output
}

/// The `rel="next"` URL from a response's headers, if there is another page.
pub fn next_page(headers: &reqwest::header::HeaderMap) -> Option<String> {
    let raw = headers.get(reqwest::header::LINK)?.to_str().ok()?;
    parse_link_header(raw).remove("next")
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod tests;
