// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repository identity.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Basic-auth pair used when cloning over HTTP.
///
/// GitHub App installs clone as `x-access-token` with the installation token
/// as the password; user-token flows use the same shape with the platform
/// token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneAuth {
    pub username: String,
    pub password: String,
}

impl CloneAuth {
    pub fn access_token(token: impl Into<String>) -> Self {
        Self { username: "x-access-token".to_string(), password: token.into() }
    }
}

/// A real Git repository, identified by `(domain, owner, name)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Repo {
    pub domain: String,
    pub owner: String,
    pub name: String,
    pub clone_url: String,

    #[serde(default)]
    pub clone_auth: Option<CloneAuth>,

    #[serde(default)]
    pub default_branch: String,

    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Error)]
pub enum RepoUrlError {
    #[error("invalid repo url '{url}': {source}")]
    Parse {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("repo url '{0}' has no host")]
    MissingHost(String),
    #[error("repo url '{0}' does not end in owner/name")]
    MissingPath(String),
}

impl Repo {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Build a repo identity from a clone URL alone, for config and chore
    /// repos that are never discovered through a platform listing.
    pub fn from_url(raw: &str) -> Result<Self, RepoUrlError> {
        let parsed = url::Url::parse(raw)
            .map_err(|source| RepoUrlError::Parse { url: raw.to_string(), source })?;

        let domain = parsed
            .host_str()
            .ok_or_else(|| RepoUrlError::MissingHost(raw.to_string()))?
            .to_string();

        let mut segments: Vec<&str> = parsed
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let name = segments.pop().ok_or_else(|| RepoUrlError::MissingPath(raw.to_string()))?;
        let owner = segments.pop().ok_or_else(|| RepoUrlError::MissingPath(raw.to_string()))?;

        // "repo" and "repo.git" are the same repository
        let name = name.strip_suffix(".git").unwrap_or(name);

        Ok(Repo {
            domain,
            owner: owner.to_string(),
            name: name.to_string(),
            clone_url: raw.to_string(),
            clone_auth: None,
            default_branch: String::new(),
            archived: false,
        })
    }
}

#[cfg(test)]
#[path = "repo_tests.rs"]
mod tests;
