// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repo-side configuration and chore definitions.
//!
//! A target repo opts in with a `.tedium.{yml,yaml,json}` file ([`RepoConfig`])
//! that names chores by the repo that defines them. Following every `extends`
//! link and merging produces the final chore list, and each entry is then
//! resolved against its defining repo's `<directory>/chore.{yml,yaml,json}`
//! file ([`ChoreSpec`]).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fallback conventional-commit type when a chore doesn't declare one.
const DEFAULT_CONVENTIONAL_TYPE: &str = "chore";

/// Configuration read from a target repo (or a repo it extends).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RepoConfig {
    /// URLs of config repos whose chores merge into this repo's set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chores: Vec<RepoChoreConfig>,
}

/// One chore to apply to a repo, identified by the repo that defines it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RepoChoreConfig {
    /// Clone URL of the chore-defining repository.
    pub url: String,

    /// Subdirectory within the chore repo that holds the chore file.
    pub directory: String,

    /// Branch to read the chore definition from; default branch if blank.
    #[serde(default)]
    pub branch: Option<String>,

    /// Extra environment passed to every step of the chore. Keys must not
    /// start with `TEDIUM_`.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub environment: HashMap<String, String>,

    /// Expose the platform auth token to chore steps as
    /// `TEDIUM_PLATFORM_TOKEN`.
    #[serde(default)]
    pub expose_platform_token: bool,
}

impl RepoChoreConfig {
    /// Chores are merged across the `extends` graph by this key.
    pub fn merge_key(&self) -> (&str, &str) {
        (&self.url, &self.directory)
    }
}

/// The result of following all `extends` links from a target repo and
/// resolving every chore reference into its actual spec.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedRepoConfig {
    pub chores: Vec<ChoreSpec>,
}

/// A chore definition, read from `<directory>/chore.{yml,yaml,json}` in the
/// chore-defining repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChoreSpec {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Conventional-commit type used for commit messages and PR titles.
    #[serde(default)]
    pub conventional_type: Option<String>,

    #[serde(default)]
    pub steps: Vec<ChoreStep>,

    #[serde(default)]
    pub skip_clone_step: bool,

    #[serde(default)]
    pub skip_finalise_step: bool,

    /// The user-side config this chore was resolved from, attached during
    /// resolution for downstream environment projection.
    #[serde(default, rename = "internal_sourceConfig")]
    pub source_config: Option<RepoChoreConfig>,
}

/// One step of a chore: a container image and a shell command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChoreStep {
    pub image: String,
    pub command: String,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub environment: HashMap<String, String>,

    /// Internal steps are injected by Tedium itself and may set `TEDIUM_*`
    /// variables; user steps may not.
    #[serde(skip)]
    pub internal: bool,
}

impl ChoreSpec {
    fn conventional_prefix(&self) -> &str {
        match self.conventional_type.as_deref() {
            Some(prefix) if !prefix.is_empty() => prefix,
            _ => DEFAULT_CONVENTIONAL_TYPE,
        }
    }

    pub fn commit_message(&self) -> String {
        format!("{}: {}", self.conventional_prefix(), self.name)
    }

    pub fn pr_title(&self) -> String {
        format!("{}: {}", self.conventional_prefix(), self.name)
    }

    pub fn pr_body(&self) -> String {
        match self.description.as_deref() {
            Some(description) if !description.is_empty() => description.to_string(),
            _ => "_No description provided by chore_".to_string(),
        }
    }
}

#[cfg(test)]
#[path = "chore_tests.rs"]
mod tests;
