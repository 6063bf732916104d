// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gitea platform adapter.
//!
//! Talks to the Gitea REST API (`https://<domain>/api/v1`) with a plain
//! user/bot token. App auth is not a Gitea concept.

use crate::pagination;
use crate::{compile_repo_filters, filters_accept, Platform, PlatformError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use regex::Regex;
use serde::Deserialize;
use tedium_core::{
    AuthConfig, CloneAuth, Job, PlatformConfig, PlatformProfile, Repo, TediumConfig,
};

const DISCOVERY_PAGE_SIZE: u32 = 100;

pub struct GiteaPlatform {
    config: PlatformConfig,
    api_base_url: String,
    client: reqwest::Client,
    filters: Vec<Regex>,
    profile: Option<PlatformProfile>,
}

#[derive(Deserialize)]
struct GiteaOwner {
    username: String,
}

#[derive(Deserialize)]
struct GiteaRepo {
    name: String,
    clone_url: String,
    #[serde(default)]
    default_branch: String,
    #[serde(default)]
    archived: bool,
    owner: GiteaOwner,
}

#[derive(Deserialize)]
struct GiteaSearchPage {
    data: Vec<GiteaRepo>,
}

#[derive(Deserialize)]
struct GiteaUser {
    email: String,
}

#[derive(Deserialize)]
struct GiteaFileContents {
    content: String,
}

#[derive(Deserialize)]
struct GiteaPrRef {
    label: String,
}

#[derive(Deserialize)]
struct GiteaPr {
    number: u64,
    state: String,
    base: GiteaPrRef,
    head: GiteaPrRef,
}

impl GiteaPlatform {
    pub fn from_config(platform_config: &PlatformConfig) -> Result<Self, PlatformError> {
        let client = reqwest::Client::builder().user_agent("Tedium").build()?;
        Ok(Self {
            config: platform_config.clone(),
            api_base_url: format!("https://{}/api/v1", platform_config.domain),
            client,
            filters: Vec::new(),
            profile: None,
        })
    }

    fn token(&self) -> Option<&str> {
        self.config.auth.as_ref().and_then(AuthConfig::token)
    }

    fn authed_request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.request(method, url);
        match self.token() {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, format!("token {token}")),
            None => request,
        }
    }

    fn clone_auth(&self) -> Option<CloneAuth> {
        self.token().map(CloneAuth::access_token)
    }

    async fn load_profile(&mut self) -> Result<(), PlatformError> {
        let url = format!("{}/user", self.api_base_url);
        let response = self.authed_request(reqwest::Method::GET, &url).send().await?;

        if !response.status().is_success() {
            return Err(PlatformError::Api {
                context: "loading Gitea user profile",
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let user: GiteaUser = response.json().await?;
        self.profile = Some(PlatformProfile { email: user.email });
        Ok(())
    }
}

#[async_trait]
impl Platform for GiteaPlatform {
    async fn init(&mut self, conf: &TediumConfig) -> Result<(), PlatformError> {
        self.filters = compile_repo_filters(&self.config)?;

        if let Some(AuthConfig::App { .. }) = self.config.auth {
            return Err(PlatformError::UnsupportedAuth(
                "gitea platforms only support user_token auth".to_string(),
            ));
        }

        // fall back to extra-auth credentials matched on our domain
        if self.config.auth.is_none() {
            if let Some(extra) = conf.extra_auth_for_domain(&self.config.domain) {
                self.config.auth = Some(extra.auth.clone());
            }
        }

        self.load_profile().await?;
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
        filters_accept(&self.filters, full_name)
    }

    fn profile(&self) -> PlatformProfile {
        self.profile.clone().unwrap_or_default()
    }

    fn auth_token(&self) -> String {
        self.token().unwrap_or_default().to_string()
    }

    fn api_base_url(&self) -> String {
        self.api_base_url.clone()
    }

    async fn discover_repos(&self) -> Result<Vec<Repo>, PlatformError> {
        let mut output = Vec::new();
        let mut next =
            Some(format!("{}/repos/search?limit={}", self.api_base_url, DISCOVERY_PAGE_SIZE));

        while let Some(url) = next {
            let response = self.authed_request(reqwest::Method::GET, &url).send().await?;

            if !response.status().is_success() {
                return Err(PlatformError::Api {
                    context: "discovering Gitea repos",
                    status: response.status().as_u16(),
                    body: response.text().await.unwrap_or_default(),
                });
            }

            next = pagination::next_page(response.headers());
            let page: GiteaSearchPage = response.json().await?;

            for repo in page.data {
                output.push(Repo {
                    domain: self.config.domain.clone(),
                    owner: repo.owner.username,
                    name: repo.name,
                    clone_url: repo.clone_url,
                    clone_auth: self.clone_auth(),
                    default_branch: repo.default_branch,
                    archived: repo.archived,
                });
            }
        }

        Ok(output)
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
            let mut url = format!(
                "{}/repos/{}/{}/contents/{}",
                self.api_base_url, repo.owner, repo.name, path
            );
            if let Some(branch) = branch {
                url.push_str(&format!("?ref={branch}"));
            }

            let response = self.authed_request(reqwest::Method::GET, &url).send().await?;

            if response.status() == reqwest::StatusCode::NOT_FOUND {
                // no match for this candidate, but there may be others
                continue;
            }

            if !response.status().is_success() {
                return Err(PlatformError::Api {
                    context: "reading file via Gitea API",
                    status: response.status().as_u16(),
                    body: response.text().await.unwrap_or_default(),
                });
            }

            let contents: GiteaFileContents = response.json().await?;
            let cleaned: String =
                contents.content.chars().filter(|c| !c.is_whitespace()).collect();
            return Ok(Some(BASE64.decode(cleaned)?));
        }

        Ok(None)
    }

    async fn open_or_update_pull_request(&self, job: &Job) -> Result<(), PlatformError> {
        tracing::info!(repo = %job.repo.full_name(), chore = %job.chore.name, "opening or updating PR");

        let list_url = format!(
            "{}/repos/{}/{}/pulls",
            self.api_base_url, job.repo.owner, job.repo.name
        );
        let response = self.authed_request(reqwest::Method::GET, &list_url).send().await?;

        if !response.status().is_success() {
            return Err(PlatformError::Api {
                context: "fetching existing PRs",
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let existing: Vec<GiteaPr> = response.json().await?;
        let existing_number = existing
            .iter()
            .find(|pr| {
                pr.state == "open"
                    && pr.base.label == job.repo.default_branch
                    && pr.head.label == job.final_branch_name
            })
            .map(|pr| pr.number);

        let body = serde_json::json!({
            "base": job.repo.default_branch,
            "head": job.final_branch_name,
            "title": job.chore.pr_title(),
            "body": job.chore.pr_body(),
        });

        let response = match existing_number {
            None => {
                tracing::debug!("opening PR");
                self.authed_request(reqwest::Method::POST, &list_url).json(&body).send().await?
            }
            Some(number) => {
                tracing::debug!(number, "updating PR");
                let url = format!("{list_url}/{number}");
                self.authed_request(reqwest::Method::PATCH, &url).json(&body).send().await?
            }
        };

        if !response.status().is_success() {
            return Err(PlatformError::Api {
                context: "opening or updating PR",
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "gitea_tests.rs"]
mod tests;
