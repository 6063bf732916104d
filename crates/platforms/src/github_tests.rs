// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tedium_core::PlatformType;

fn config(auth: Option<AuthConfig>) -> PlatformConfig {
    PlatformConfig {
        platform_type: PlatformType::Github,
        domain: "github.com".to_string(),
        auth,
        repo_filters: Vec::new(),
        skip_discovery: false,
    }
}

#[test]
fn api_base_url_uses_api_subdomain() {
    let platform = GitHubPlatform::from_config(&config(None)).unwrap();
    assert_eq!(platform.api_base_url(), "https://api.github.com");
}

#[test]
fn app_email_is_the_noreply_bot_address() {
    assert_eq!(app_email("tedium-app"), "tedium-app[bot]@users.noreply.github.com");
}

#[test]
fn request_token_requires_auth() {
    let platform = GitHubPlatform::from_config(&config(None)).unwrap();
    assert!(matches!(platform.request_token(), Err(PlatformError::MissingAuth { .. })));
}

#[test]
fn app_auth_has_no_request_token_until_minted() {
    let platform = GitHubPlatform::from_config(&config(Some(AuthConfig::App {
        client_id: "client".to_string(),
        private_key_string: Some("pem".to_string()),
        private_key_file: None,
        installation_id: "1".to_string(),
        installation_token: None,
    })))
    .unwrap();
    assert!(matches!(platform.request_token(), Err(PlatformError::MissingAuth { .. })));
    assert_eq!(platform.auth_token(), "");
}

#[test]
fn minted_token_flows_into_clone_auth() {
    let platform = GitHubPlatform::from_config(&config(Some(AuthConfig::App {
        client_id: "client".to_string(),
        private_key_string: Some("pem".to_string()),
        private_key_file: None,
        installation_id: "1".to_string(),
        installation_token: Some("installation-tok".to_string()),
    })))
    .unwrap();

    assert_eq!(platform.request_token().unwrap(), "installation-tok");
    let clone_auth = platform.clone_auth().unwrap();
    assert_eq!(clone_auth.username, "x-access-token");
    assert_eq!(clone_auth.password, "installation-tok");
}
