// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GitHub platform adapter.
//!
//! Two auth flows:
//!
//! - `user_token`: a plain bearer token, used for every request.
//! - `app`: an RS256 JWT identifies the app itself (profile lookup, token
//!   minting); a short-lived installation access token, minted during init,
//!   is used for everything repo-scoped. The minted token is written back
//!   into the platform config so jobs built from it stay self-contained.

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

pub struct GitHubPlatform {
    config: PlatformConfig,
    api_base_url: String,
    client: reqwest::Client,
    filters: Vec<Regex>,
    profile: Option<PlatformProfile>,
}

#[derive(Deserialize)]
struct GitHubOwner {
    login: String,
}

#[derive(Deserialize)]
struct GitHubRepo {
    name: String,
    clone_url: String,
    #[serde(default)]
    default_branch: String,
    #[serde(default)]
    archived: bool,
    owner: GitHubOwner,
}

#[derive(Deserialize)]
struct GitHubInstallationRepos {
    repositories: Vec<GitHubRepo>,
}

#[derive(Deserialize)]
struct GitHubEmail {
    email: String,
    primary: bool,
}

#[derive(Deserialize)]
struct GitHubAppProfile {
    slug: String,
}

#[derive(Deserialize)]
struct GitHubInstallationToken {
    token: String,
}

#[derive(Deserialize)]
struct GitHubFileContents {
    content: String,
}

#[derive(Deserialize)]
struct GitHubPrRef {
    label: String,
}

#[derive(Deserialize)]
struct GitHubPr {
    number: u64,
    state: String,
    base: GitHubPrRef,
    head: GitHubPrRef,
}

impl GitHubPlatform {
    pub fn from_config(platform_config: &PlatformConfig) -> Result<Self, PlatformError> {
        let client = reqwest::Client::builder().user_agent("Tedium").build()?;
        Ok(Self {
            config: platform_config.clone(),
            api_base_url: format!("https://api.{}", platform_config.domain),
            client,
            filters: Vec::new(),
            profile: None,
        })
    }

    fn auth(&self) -> Result<&AuthConfig, PlatformError> {
        self.config
            .auth
            .as_ref()
            .ok_or_else(|| PlatformError::MissingAuth { domain: self.config.domain.clone() })
    }

    /// Bearer token for repo-scoped requests: the user token, or the
    /// installation token minted during init.
    fn request_token(&self) -> Result<&str, PlatformError> {
        self.auth()?
            .token()
            .ok_or_else(|| PlatformError::MissingAuth { domain: self.config.domain.clone() })
    }

    fn bearer_request(
        &self,
        method: reqwest::Method,
        url: &str,
        token: &str,
    ) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {token}"))
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
    }

    /// Request authed as the user or installation, for repo-scoped calls.
    fn authed_request(
        &self,
        method: reqwest::Method,
        url: &str,
    ) -> Result<reqwest::RequestBuilder, PlatformError> {
        let token = self.request_token()?;
        Ok(self.bearer_request(method, url, token))
    }

    fn clone_auth(&self) -> Option<CloneAuth> {
        self.config.auth.as_ref().and_then(AuthConfig::token).map(CloneAuth::access_token)
    }

    /// Exchange the app JWT for an installation access token and cache it in
    /// the platform config.
    async fn mint_installation_token(&mut self) -> Result<(), PlatformError> {
        let AuthConfig::App { installation_id, installation_token, .. } = self.auth()? else {
            return Ok(());
        };

        if installation_token.is_some() {
            return Ok(());
        }

        let jwt = self.auth()?.generate_jwt()?;
        let url = format!("{}/app/installations/{}/access_tokens", self.api_base_url, installation_id);
        let response = self.bearer_request(reqwest::Method::POST, &url, &jwt).send().await?;

        if !response.status().is_success() {
            return Err(PlatformError::Api {
                context: "generating installation access token",
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let minted: GitHubInstallationToken = response.json().await?;
        if let Some(AuthConfig::App { installation_token, .. }) = self.config.auth.as_mut() {
            *installation_token = Some(minted.token);
        }
        Ok(())
    }

    async fn load_profile(&mut self) -> Result<(), PlatformError> {
        match self.auth()? {
            AuthConfig::UserToken { .. } => {
                let url = format!("{}/user/emails", self.api_base_url);
                let response = self.authed_request(reqwest::Method::GET, &url)?.send().await?;

                if !response.status().is_success() {
                    return Err(PlatformError::Api {
                        context: "loading GitHub user profile",
                        status: response.status().as_u16(),
                        body: response.text().await.unwrap_or_default(),
                    });
                }

                let emails: Vec<GitHubEmail> = response.json().await?;
                let primary = emails
                    .into_iter()
                    .find(|email| email.primary)
                    .ok_or_else(|| PlatformError::Profile("no primary email address".to_string()))?;

                self.profile = Some(PlatformProfile { email: primary.email });
            }

            AuthConfig::App { .. } => {
                let jwt = self.auth()?.generate_jwt()?;
                let url = format!("{}/app", self.api_base_url);
                let response =
                    self.bearer_request(reqwest::Method::GET, &url, &jwt).send().await?;

                if !response.status().is_success() {
                    return Err(PlatformError::Api {
                        context: "loading GitHub app profile",
                        status: response.status().as_u16(),
                        body: response.text().await.unwrap_or_default(),
                    });
                }

                let app: GitHubAppProfile = response.json().await?;
                self.profile = Some(PlatformProfile { email: app_email(&app.slug) });
            }
        }

        Ok(())
    }

    async fn discover_page(&self, url: &str) -> Result<(Vec<GitHubRepo>, Option<String>), PlatformError> {
        let response = self.authed_request(reqwest::Method::GET, url)?.send().await?;

        if !response.status().is_success() {
            return Err(PlatformError::Api {
                context: "discovering GitHub repos",
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let next = pagination::next_page(response.headers());
        let repos = match self.auth()? {
            AuthConfig::UserToken { .. } => response.json::<Vec<GitHubRepo>>().await?,
            AuthConfig::App { .. } => {
                response.json::<GitHubInstallationRepos>().await?.repositories
            }
        };

        Ok((repos, next))
    }
}

/// The no-reply address a GitHub App commits as.
pub(crate) fn app_email(slug: &str) -> String {
    format!("{slug}[bot]@users.noreply.github.com")
}

#[async_trait]
impl Platform for GitHubPlatform {
    async fn init(&mut self, conf: &TediumConfig) -> Result<(), PlatformError> {
        self.filters = compile_repo_filters(&self.config)?;

        // fall back to extra-auth credentials matched on our domain
        if self.config.auth.is_none() {
            if let Some(extra) = conf.extra_auth_for_domain(&self.config.domain) {
                self.config.auth = Some(extra.auth.clone());
            }
        }

        // read the private key off disk now; the envelope can't carry a path
        if let Some(auth) = self.config.auth.as_mut() {
            auth.load_private_key()?;
        }

        self.mint_installation_token().await?;
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
        self.config
            .auth
            .as_ref()
            .and_then(AuthConfig::token)
            .unwrap_or_default()
            .to_string()
    }

    fn api_base_url(&self) -> String {
        self.api_base_url.clone()
    }

    async fn discover_repos(&self) -> Result<Vec<Repo>, PlatformError> {
        let first = match self.auth()? {
            AuthConfig::UserToken { .. } => {
                format!("{}/user/repos?per_page={}", self.api_base_url, DISCOVERY_PAGE_SIZE)
            }
            AuthConfig::App { .. } => format!(
                "{}/installation/repositories?per_page={}",
                self.api_base_url, DISCOVERY_PAGE_SIZE
            ),
        };

        let mut output = Vec::new();
        let mut next = Some(first);
        while let Some(url) = next {
            let (repos, next_url) = self.discover_page(&url).await?;
            next = next_url;

            for repo in repos {
                output.push(Repo {
                    domain: self.config.domain.clone(),
                    owner: repo.owner.login,
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

            let response = self.authed_request(reqwest::Method::GET, &url)?.send().await?;

            if response.status() == reqwest::StatusCode::NOT_FOUND {
                // no match for this candidate, but there may be others
                continue;
            }

            if !response.status().is_success() {
                return Err(PlatformError::Api {
                    context: "reading file via GitHub API",
                    status: response.status().as_u16(),
                    body: response.text().await.unwrap_or_default(),
                });
            }

            let contents: GitHubFileContents = response.json().await?;
            let cleaned: String =
                contents.content.chars().filter(|c| !c.is_whitespace()).collect();
            return Ok(Some(BASE64.decode(cleaned)?));
        }

        Ok(None)
    }

    async fn open_or_update_pull_request(&self, job: &Job) -> Result<(), PlatformError> {
        tracing::info!(repo = %job.repo.full_name(), chore = %job.chore.name, "opening or updating PR");

        // GitHub PR labels are "owner:branch"
        let base_label = format!("{}:{}", job.repo.owner, job.repo.default_branch);
        let head_label = format!("{}:{}", job.repo.owner, job.final_branch_name);

        let list_url = format!(
            "{}/repos/{}/{}/pulls",
            self.api_base_url, job.repo.owner, job.repo.name
        );
        let response = self.authed_request(reqwest::Method::GET, &list_url)?.send().await?;

        if !response.status().is_success() {
            return Err(PlatformError::Api {
                context: "fetching existing PRs",
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let existing: Vec<GitHubPr> = response.json().await?;
        let existing_number = existing
            .iter()
            .find(|pr| {
                pr.state == "open" && pr.base.label == base_label && pr.head.label == head_label
            })
            .map(|pr| pr.number);

        let body = serde_json::json!({
            "base": job.repo.default_branch,
            "head": head_label,
            "title": job.chore.pr_title(),
            "body": job.chore.pr_body(),
        });

        let response = match existing_number {
            None => {
                tracing::debug!("opening PR");
                self.authed_request(reqwest::Method::POST, &list_url)?.json(&body).send().await?
            }
            Some(number) => {
                tracing::debug!(number, "updating PR");
                let url = format!("{list_url}/{number}");
                self.authed_request(reqwest::Method::PATCH, &url)?.json(&body).send().await?
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
#[path = "github_tests.rs"]
mod tests;
