// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tedium-platforms: Git platform adapters.
//!
//! Every platform (Gitea, GitHub) implements the [`Platform`] trait; the core
//! consumes nothing else. Selection is closed, by the `type` field in config.
//! Initialised adapters are collected into a [`PlatformRegistry`] keyed by
//! domain so cross-repo config reads can find the right adapter.

pub mod gitea;
pub mod github;
pub mod pagination;
pub mod registry;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use gitea::GiteaPlatform;
pub use github::GitHubPlatform;
pub use registry::PlatformRegistry;

use async_trait::async_trait;
use tedium_core::{
    AuthError, Job, PlatformConfig, PlatformProfile, PlatformType, Repo, RepoUrlError,
    TediumConfig,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{context}: status {status}: {body}")]
    Api { context: &'static str, status: u16, body: String },
    #[error("failed to decode base64 file content: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("no auth configured for platform {domain}")]
    MissingAuth { domain: String },
    #[error("unsupported auth type: {0}")]
    UnsupportedAuth(String),
    #[error("failed to load platform profile: {0}")]
    Profile(String),
    #[error("error compiling repo filter regex '{pattern}': {source}")]
    Filter {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("duplicate platform domain: {0}")]
    DuplicateDomain(String),
    #[error("no platform accepts domain '{0}'")]
    UnknownDomain(String),
    #[error(transparent)]
    RepoUrl(#[from] RepoUrlError),
}

/// The operations the core needs from a Git platform.
///
/// Implementations must be safe for concurrent read calls from multiple
/// workers; all mutation happens in [`Platform::init`], which runs before an
/// adapter enters the registry.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Resolve auth, mint short-lived tokens, and load the bot identity.
    async fn init(&mut self, conf: &TediumConfig) -> Result<(), PlatformError>;

    /// Best-effort cleanup after the run.
    async fn deinit(&self) -> Result<(), PlatformError>;

    /// This adapter's platform config, including any auth state resolved
    /// during init (so jobs built from it are self-contained).
    fn config(&self) -> &PlatformConfig;

    fn accepts_domain(&self, domain: &str) -> bool;

    /// Whether `owner/name` passes this platform's repo filters.
    fn accepts_repo(&self, full_name: &str) -> bool;

    /// The identity this adapter acts as; commits are authored with it.
    fn profile(&self) -> PlatformProfile;

    /// Opaque bearer token for API and clone auth. May be empty when the
    /// platform has no auth configured.
    fn auth_token(&self) -> String;

    /// API base URL derived from the configured domain.
    fn api_base_url(&self) -> String;

    /// All repos visible to this adapter, in platform order.
    async fn discover_repos(&self) -> Result<Vec<Repo>, PlatformError>;

    /// Whether the repo opts in with a `.tedium.{yml,yaml,json}` file.
    async fn repo_has_tedium_config(&self, repo: &Repo) -> Result<bool, PlatformError>;

    /// Read the first path candidate that exists in the repo, from `branch`
    /// or the default branch. A 404 on every candidate is `Ok(None)`, not an
    /// error.
    async fn read_repo_file(
        &self,
        repo: &Repo,
        branch: Option<&str>,
        path_candidates: &[String],
    ) -> Result<Option<Vec<u8>>, PlatformError>;

    /// Open a PR from the job's final branch to the default branch, or
    /// update the existing open one.
    async fn open_or_update_pull_request(&self, job: &Job) -> Result<(), PlatformError>;
}

/// Build the adapter for a platform config. Selection is a closed set.
pub fn from_config(platform_config: &PlatformConfig) -> Result<Box<dyn Platform>, PlatformError> {
    match platform_config.platform_type {
        PlatformType::Gitea => Ok(Box::new(GiteaPlatform::from_config(platform_config)?)),
        PlatformType::Github => Ok(Box::new(GitHubPlatform::from_config(platform_config)?)),
    }
}

/// Compile a platform's repo filters, failing on the first bad pattern.
pub(crate) fn compile_repo_filters(
    config: &PlatformConfig,
) -> Result<Vec<regex::Regex>, PlatformError> {
    config
        .repo_filters
        .iter()
        .map(|pattern| {
            regex::Regex::new(pattern)
                .map_err(|source| PlatformError::Filter { pattern: pattern.clone(), source })
        })
        .collect()
}

/// Shared filter semantics: no filters means everything is accepted.
pub(crate) fn filters_accept(filters: &[regex::Regex], full_name: &str) -> bool {
    filters.is_empty() || filters.iter().any(|filter| filter.is_match(full_name))
}
