// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tedium_core::PlatformType;

fn config(auth: Option<AuthConfig>) -> PlatformConfig {
    PlatformConfig {
        platform_type: PlatformType::Gitea,
        domain: "git.example.com".to_string(),
        auth,
        repo_filters: Vec::new(),
        skip_discovery: false,
    }
}

#[test]
fn api_base_url_is_derived_from_domain() {
    let platform = GiteaPlatform::from_config(&config(None)).unwrap();
    assert_eq!(platform.api_base_url(), "https://git.example.com/api/v1");
}

#[test]
fn accepts_only_its_own_domain() {
    let platform = GiteaPlatform::from_config(&config(None)).unwrap();
    assert!(platform.accepts_domain("git.example.com"));
    assert!(!platform.accepts_domain("github.com"));
}

#[test]
fn auth_token_is_empty_without_auth() {
    let platform = GiteaPlatform::from_config(&config(None)).unwrap();
    assert_eq!(platform.auth_token(), "");
    assert!(platform.clone_auth().is_none());
}

#[test]
fn clone_auth_wraps_the_platform_token() {
    let platform = GiteaPlatform::from_config(&config(Some(AuthConfig::UserToken {
        token: "tok".to_string(),
    })))
    .unwrap();
    assert_eq!(platform.auth_token(), "tok");

    let clone_auth = platform.clone_auth().unwrap();
    assert_eq!(clone_auth.username, "x-access-token");
    assert_eq!(clone_auth.password, "tok");
}

#[test]
fn profile_is_empty_before_init() {
    let platform = GiteaPlatform::from_config(&config(None)).unwrap();
    assert_eq!(platform.profile(), PlatformProfile::default());
}
