// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn from_url_extracts_identity() {
    let repo = Repo::from_url("https://git.example.com/acme/widgets.git").unwrap();
    assert_eq!(repo.domain, "git.example.com");
    assert_eq!(repo.owner, "acme");
    assert_eq!(repo.name, "widgets");
    assert_eq!(repo.full_name(), "acme/widgets");
    assert_eq!(repo.clone_url, "https://git.example.com/acme/widgets.git");
}

#[test]
fn from_url_without_git_suffix() {
    let repo = Repo::from_url("https://github.com/acme/widgets").unwrap();
    assert_eq!(repo.name, "widgets");
}

#[test]
fn from_url_rejects_bare_domain() {
    assert!(matches!(
        Repo::from_url("https://git.example.com/"),
        Err(RepoUrlError::MissingPath(_))
    ));
}

#[test]
fn from_url_rejects_garbage() {
    assert!(matches!(Repo::from_url("not a url"), Err(RepoUrlError::Parse { .. })));
}

#[test]
fn clone_auth_uses_access_token_username() {
    let auth = CloneAuth::access_token("tok");
    assert_eq!(auth.username, "x-access-token");
    assert_eq!(auth.password, "tok");
}
