// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration resolver: follow `extends` links and merge chore lists.
//!
//! The walk is breadth-first from the target repo. Every parsed config is
//! pushed onto a LIFO stack, and the merge pops that stack, so the configs
//! furthest from the target fold in first and the target's own config folds
//! in last — the deepest override wins. Loops are tolerated: a URL is
//! visited at most once, and seeing it again is only a warning.

use std::collections::{HashSet, VecDeque};
use tedium_core::{
    config_file_candidates, ChoreSpec, Repo, RepoChoreConfig, RepoConfig, ResolvedRepoConfig,
};
use tedium_platforms::{Platform, PlatformError, PlatformRegistry};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error("config repo {url} has no readable config file")]
    MissingExtendedConfig { url: String },
    #[error("failed to parse config from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("chore repo {url} has no chore file in directory '{directory}'")]
    MissingChoreFile { url: String, directory: String },
    #[error("failed to parse chore spec from {url} directory '{directory}': {source}")]
    ParseChore {
        url: String,
        directory: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Resolve the full chore list for a target repo.
///
/// Returns `Ok(None)` when the target has no Tedium config at all — that is
/// a skip, not a fault. Anything missing beyond that point (an extended
/// config, a chore file) fails the resolution for this repo.
pub async fn resolve_repo_config(
    registry: &PlatformRegistry,
    target_repo: &Repo,
) -> Result<Option<ResolvedRepoConfig>, ResolveError> {
    let Some(merged) = walk_and_merge(registry, target_repo).await? else {
        return Ok(None);
    };

    let mut chores = Vec::with_capacity(merged.chores.len());
    for chore_config in merged.chores {
        chores.push(materialise_chore(registry, chore_config).await?);
    }

    Ok(Some(ResolvedRepoConfig { chores }))
}

/// Walk the `extends` graph and fold every config into one.
async fn walk_and_merge(
    registry: &PlatformRegistry,
    target_repo: &Repo,
) -> Result<Option<RepoConfig>, ResolveError> {
    let target_platform = registry
        .for_domain(&target_repo.domain)
        .ok_or_else(|| PlatformError::UnknownDomain(target_repo.domain.clone()))?;

    let mut visited: HashSet<String> = HashSet::new();
    let mut to_visit: VecDeque<String> = VecDeque::new();
    let mut parsed_stack: Vec<RepoConfig> = Vec::new();

    visited.insert(target_repo.clone_url.clone());
    to_visit.push_back(target_repo.clone_url.clone());

    while let Some(url) = to_visit.pop_front() {
        let is_target = url == target_repo.clone_url;

        let contents = if is_target {
            target_platform
                .read_repo_file(target_repo, None, &config_file_candidates(".tedium"))
                .await?
        } else {
            let (config_repo, platform) = registry.repo_from_url(&url)?;
            platform
                .read_repo_file(&config_repo, None, &config_file_candidates("index"))
                .await?
        };

        let contents = match contents {
            Some(contents) => contents,
            None if is_target => return Ok(None),
            None => return Err(ResolveError::MissingExtendedConfig { url }),
        };

        let config: RepoConfig = serde_yaml::from_slice(&contents)
            .map_err(|source| ResolveError::Parse { url: url.clone(), source })?;

        for extends_url in &config.extends {
            if visited.contains(extends_url) {
                tracing::warn!(url = %extends_url, "loop detected in config extension - saw a URL for the second time");
            } else {
                visited.insert(extends_url.clone());
                to_visit.push_back(extends_url.clone());
            }
        }

        parsed_stack.push(config);
    }

    // pop the stack: extended configs first, the target last
    let mut merged = RepoConfig::default();
    while let Some(config) = parsed_stack.pop() {
        merge_repo_config(&mut merged, config);
    }

    Ok(Some(merged))
}

/// Fold one config into the accumulator.
///
/// Chores are keyed by `(url, directory)`; a matching incoming chore merges
/// field-wise and a non-matching one is appended. `extends` is never carried
/// into the merged output — the walk has already consumed it.
fn merge_repo_config(merged: &mut RepoConfig, incoming: RepoConfig) {
    for incoming_chore in incoming.chores {
        match merged.chores.iter_mut().find(|c| c.merge_key() == incoming_chore.merge_key()) {
            Some(existing) => merge_chore_config(existing, incoming_chore),
            None => merged.chores.push(incoming_chore),
        }
    }
}

fn merge_chore_config(existing: &mut RepoChoreConfig, incoming: RepoChoreConfig) {
    existing.expose_platform_token |= incoming.expose_platform_token;

    if incoming.branch.as_deref().is_some_and(|branch| !branch.is_empty()) {
        existing.branch = incoming.branch;
    }

    // per-key overlay: the incoming (deeper) config wins
    existing.environment.extend(incoming.environment);
}

/// Read and decode one chore's spec from its defining repository.
async fn materialise_chore(
    registry: &PlatformRegistry,
    chore_config: RepoChoreConfig,
) -> Result<ChoreSpec, ResolveError> {
    let (chore_repo, platform) = registry.repo_from_url(&chore_config.url)?;

    let candidates = config_file_candidates(&format!("{}/chore", chore_config.directory));
    let contents = platform
        .read_repo_file(&chore_repo, chore_config.branch.as_deref(), &candidates)
        .await?
        .ok_or_else(|| ResolveError::MissingChoreFile {
            url: chore_config.url.clone(),
            directory: chore_config.directory.clone(),
        })?;

    let mut spec: ChoreSpec =
        serde_yaml::from_slice(&contents).map_err(|source| ResolveError::ParseChore {
            url: chore_config.url.clone(),
            directory: chore_config.directory.clone(),
            source,
        })?;

    spec.source_config = Some(chore_config);
    Ok(spec)
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
