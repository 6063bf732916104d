// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain → adapter registry.
//!
//! Built serially during the init phase, then shared immutably with workers.
//! The registry is an explicit value passed through the orchestrator rather
//! than ambient process state, so tests can substitute their own adapters.

use crate::{Platform, PlatformError};
use std::collections::HashMap;
use std::sync::Arc;
use tedium_core::Repo;

#[derive(Default)]
pub struct PlatformRegistry {
    by_domain: HashMap<String, Arc<dyn Platform>>,
}

impl PlatformRegistry {
    /// Register an initialised adapter under its configured domain.
    pub fn insert(&mut self, platform: Arc<dyn Platform>) -> Result<(), PlatformError> {
        let domain = platform.config().domain.clone();
        if self.by_domain.contains_key(&domain) {
            return Err(PlatformError::DuplicateDomain(domain));
        }
        self.by_domain.insert(domain, platform);
        Ok(())
    }

    /// The adapter for a domain, if any accepts it.
    pub fn for_domain(&self, domain: &str) -> Option<Arc<dyn Platform>> {
        if let Some(platform) = self.by_domain.get(domain) {
            return Some(Arc::clone(platform));
        }
        self.by_domain.values().find(|p| p.accepts_domain(domain)).map(Arc::clone)
    }

    /// Resolve a repo URL to its identity and owning adapter. Used when
    /// reading extended-config and chore repos that were never discovered.
    pub fn repo_from_url(&self, url: &str) -> Result<(Repo, Arc<dyn Platform>), PlatformError> {
        let repo = Repo::from_url(url)?;
        let platform = self
            .for_domain(&repo.domain)
            .ok_or_else(|| PlatformError::UnknownDomain(repo.domain.clone()))?;
        Ok((repo, platform))
    }

    pub fn platforms(&self) -> impl Iterator<Item = &Arc<dyn Platform>> {
        self.by_domain.values()
    }

    pub fn is_empty(&self) -> bool {
        self.by_domain.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
