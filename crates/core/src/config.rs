// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process configuration, loaded once at startup and immutable afterwards.

use crate::chore::RepoConfig;
use crate::platform::{ExtraAuth, PlatformConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

const DEFAULT_TEDIUM_IMAGE: &str = "ghcr.io/markormesher/tedium:v0";
const DEFAULT_PAUSE_IMAGE: &str = "ghcr.io/markormesher/tedium-pause:v0";

/// Top-level configuration passed to the `tedium` binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TediumConfig {
    /// The sandbox backend used to perform chores. Exactly one must be set.
    pub executor: ExecutorConfig,

    /// Platforms that repos are discovered from. Domains must be unique.
    #[serde(default)]
    pub platforms: Vec<PlatformConfig>,

    /// Additional credentials matched by domain pattern.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_auth: Vec<ExtraAuth>,

    /// Container images for the Tedium-owned stages of execution.
    #[serde(default)]
    pub images: ImagesConfig,

    /// Tedium config applied to repos that don't have one. Parsed and
    /// preserved, but not yet implemented: enabling it fails validation.
    #[serde(default)]
    pub auto_enrollment: AutoEnrollmentConfig,

    /// How many chores may execute at once.
    #[serde(default = "default_chore_concurrency")]
    pub chore_concurrency: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExecutorConfig {
    #[serde(default)]
    pub podman: Option<PodmanExecutorConfig>,
    #[serde(default)]
    pub kubernetes: Option<KubernetesExecutorConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PodmanExecutorConfig {
    /// Socket used to talk to Podman. Local default if not supplied.
    #[serde(default)]
    pub socket_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KubernetesExecutorConfig {
    /// Kubeconfig for cluster access. In-cluster config if not supplied.
    #[serde(default)]
    pub kubeconfig_path: Option<String>,

    /// Namespace chores execute in. Defaults to "default".
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ImagesConfig {
    #[serde(default = "default_tedium_image")]
    pub tedium: String,
    #[serde(default = "default_pause_image")]
    pub pause: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self { tedium: default_tedium_image(), pause: default_pause_image() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AutoEnrollmentConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub config: RepoConfig,
}

fn default_chore_concurrency() -> usize {
    1
}

fn default_tedium_image() -> String {
    DEFAULT_TEDIUM_IMAGE.to_string()
}

fn default_pause_image() -> String {
    DEFAULT_PAUSE_IMAGE.to_string()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error reading configuration file: {0}")]
    Read(#[from] std::io::Error),
    #[error("unacceptable config file format: {0}")]
    UnknownFormat(String),
    #[error("error parsing configuration file: {0}")]
    ParseYaml(#[from] serde_yaml::Error),
    #[error("error parsing configuration file: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("exactly one executor must be configured")]
    ExecutorCount,
    #[error("duplicate platform domain: {0}")]
    DuplicateDomain(String),
    #[error("choreConcurrency must be at least 1")]
    ZeroConcurrency,
    #[error("error compiling repo filter regex '{pattern}': {source}")]
    BadFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("error compiling domain pattern regex '{pattern}': {source}")]
    BadDomainPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("auto-enrollment is not implemented; remove autoEnrollment.enabled")]
    AutoEnrollmentUnimplemented,
}

impl TediumConfig {
    /// Load and validate a config file. The format is chosen by extension;
    /// unknown fields fail parsing.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let conf: TediumConfig = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)?,
            "json" => serde_json::from_str(&contents)?,
            _ => return Err(ConfigError::UnknownFormat(path.display().to_string())),
        };

        conf.validate()?;
        Ok(conf)
    }

    /// Check the invariants that must hold before a run starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (&self.executor.podman, &self.executor.kubernetes) {
            (Some(_), None) | (None, Some(_)) => {}
            _ => return Err(ConfigError::ExecutorCount),
        }

        let mut domains = HashSet::new();
        for platform in &self.platforms {
            if !domains.insert(platform.domain.as_str()) {
                return Err(ConfigError::DuplicateDomain(platform.domain.clone()));
            }

            for pattern in &platform.repo_filters {
                regex::Regex::new(pattern).map_err(|source| ConfigError::BadFilter {
                    pattern: pattern.clone(),
                    source,
                })?;
            }
        }

        for extra in &self.extra_auth {
            regex::Regex::new(&extra.domain_pattern).map_err(|source| {
                ConfigError::BadDomainPattern { pattern: extra.domain_pattern.clone(), source }
            })?;
        }

        if self.chore_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }

        if self.auto_enrollment.enabled {
            return Err(ConfigError::AutoEnrollmentUnimplemented);
        }

        Ok(())
    }

    /// Find extra-auth credentials whose domain pattern matches `domain`.
    ///
    /// Used for clone auth on domains whose platform carries no auth.
    pub fn extra_auth_for_domain(&self, domain: &str) -> Option<&ExtraAuth> {
        self.extra_auth.iter().find(|extra| {
            match regex::Regex::new(&extra.domain_pattern) {
                Ok(pattern) => pattern.is_match(domain),
                Err(_) => {
                    // validated at load time; unreachable for loaded configs
                    tracing::warn!(
                        pattern = %extra.domain_pattern,
                        "skipping extra auth entry with invalid domain pattern"
                    );
                    false
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
