// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_multiple_rels() {
    let raw = r#"<https://api.example.com/repos?page=2>; rel="next", <https://api.example.com/repos?page=9>; rel="last""#;
    let links = parse_link_header(raw);
    assert_eq!(links["next"], "https://api.example.com/repos?page=2");
    assert_eq!(links["last"], "https://api.example.com/repos?page=9");
}

#[test]
fn tolerates_extra_whitespace() {
    let raw = r#"<https://a.example.com/x?page=2>;  rel="next""#;
    let links = parse_link_header(raw);
    assert_eq!(links["next"], "https://a.example.com/x?page=2");
}

#[test]
fn empty_header_yields_no_links() {
    assert!(parse_link_header("").is_empty());
}

#[test]
fn garbage_chunks_are_ignored() {
    let raw = r#"nonsense, <https://a.example.com/x?page=3>; rel="next""#;
    let links = parse_link_header(raw);
    assert_eq!(links.len(), 1);
    assert_eq!(links["next"], "https://a.example.com/x?page=3");
}

#[test]
fn next_page_reads_response_headers() {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::LINK,
        r#"<https://api.example.com/repos?page=2>; rel="next""#.parse().unwrap(),
    );
    assert_eq!(next_page(&headers).as_deref(), Some("https://api.example.com/repos?page=2"));

    let empty = reqwest::header::HeaderMap::new();
    assert_eq!(next_page(&empty), None);
}
