// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory platform double for resolver and orchestrator tests.

use crate::{Platform, PlatformError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tedium_core::{
    AuthConfig, Job, PlatformConfig, PlatformProfile, PlatformType, Repo, TediumConfig,
};

type FileKey = (String, Option<String>, String);

/// A platform backed by in-memory maps instead of a REST API.
///
/// Files are keyed by `(owner/name, branch, path)`; a file registered with
/// `branch = None` is only visible to default-branch reads, mirroring how a
/// pinned branch changes what the real adapters fetch.
pub struct FakePlatform {
    config: PlatformConfig,
    profile: PlatformProfile,
    repos: Vec<Repo>,
    files: HashMap<FileKey, Vec<u8>>,
    pub pr_calls: Mutex<Vec<String>>,
    pub file_reads: Mutex<Vec<String>>,
}

impl FakePlatform {
    pub fn new(domain: &str) -> Self {
        Self {
            config: PlatformConfig {
                platform_type: PlatformType::Gitea,
                domain: domain.to_string(),
                auth: Some(AuthConfig::UserToken { token: "fake-token".to_string() }),
                repo_filters: Vec::new(),
                skip_discovery: false,
            },
            profile: PlatformProfile { email: "bot@example.com".to_string() },
            repos: Vec::new(),
            files: HashMap::new(),
            pr_calls: Mutex::new(Vec::new()),
            file_reads: Mutex::new(Vec::new()),
        }
    }

    pub fn with_repo_filters(mut self, filters: &[&str]) -> Self {
        self.config.repo_filters = filters.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn set_skip_discovery(&mut self) {
        self.config.skip_discovery = true;
    }

    pub fn with_repo(mut self, repo: Repo) -> Self {
        self.repos.push(repo);
        self
    }

    pub fn with_file(mut self, full_name: &str, path: &str, contents: &str) -> Self {
        self.files
            .insert((full_name.to_string(), None, path.to_string()), contents.as_bytes().to_vec());
        self
    }

    pub fn with_branch_file(
        mut self,
        full_name: &str,
        branch: &str,
        path: &str,
        contents: &str,
    ) -> Self {
        self.files.insert(
            (full_name.to_string(), Some(branch.to_string()), path.to_string()),
            contents.as_bytes().to_vec(),
        );
        self
    }

    /// A plain repo on this platform's domain.
    pub fn repo(&self, owner: &str, name: &str) -> Repo {
        Repo {
            domain: self.config.domain.clone(),
            owner: owner.to_string(),
            name: name.to_string(),
            clone_url: format!("https://{}/{}/{}.git", self.config.domain, owner, name),
            clone_auth: None,
            default_branch: "main".to_string(),
            archived: false,
        }
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn init(&mut self, _conf: &TediumConfig) -> Result<(), PlatformError> {
        Ok(())
    }

    async fn deinit(&self) -> Result<(), PlatformError> {
        Ok(())
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }

    fn accepts_domain(&self, domain: &str) -> bool {
        domain == self.config.domain
    }

    fn accepts_repo(&self, full_name: &str) -> bool {
        if self.config.repo_filters.is_empty() {
            return true;
        }
        self.config.repo_filters.iter().any(|pattern| {
            regex::Regex::new(pattern).map(|filter| filter.is_match(full_name)).unwrap_or(false)
        })
    }

    fn profile(&self) -> PlatformProfile {
        self.profile.clone()
    }

    fn auth_token(&self) -> String {
        "fake-token".to_string()
    }

    fn api_base_url(&self) -> String {
        format!("https://{}/api/v1", self.config.domain)
    }

    async fn discover_repos(&self) -> Result<Vec<Repo>, PlatformError> {
        Ok(self.repos.clone())
    }

    async fn repo_has_tedium_config(&self, repo: &Repo) -> Result<bool, PlatformError> {
        let candidates = tedium_core::config_file_candidates(".tedium");
        Ok(self.read_repo_file(repo, None, &candidates).await?.is_some())
    }

    async fn read_repo_file(
        &self,
        repo: &Repo,
        branch: Option<&str>,
        path_candidates: &[String],
    ) -> Result<Option<Vec<u8>>, PlatformError> {
        for path in path_candidates {
            self.file_reads.lock().push(format!("{}:{}", repo.full_name(), path));
            let key =
                (repo.full_name(), branch.map(str::to_string), path.clone());
            if let Some(contents) = self.files.get(&key) {
                return Ok(Some(contents.clone()));
            }
        }
        Ok(None)
    }

    async fn open_or_update_pull_request(&self, job: &Job) -> Result<(), PlatformError> {
        self.pr_calls.lock().push(job.chore.name.clone());
        Ok(())
    }
}
