// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job envelope.
//!
//! A [`Job`] bundles everything one chore run needs: the process config, the
//! target repo, the chore spec, the owning platform's config, and the branch
//! names. It crosses the process boundary into the sandbox as a single JSON
//! blob in the `TEDIUM_JOB` environment variable, so an in-sandbox stage can
//! do its work without ever talking back to the driver.

use crate::chore::ChoreSpec;
use crate::config::TediumConfig;
use crate::platform::PlatformConfig;
use crate::repo::Repo;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Environment variable carrying the JSON-encoded job.
pub const ENV_JOB: &str = "TEDIUM_JOB";

/// The workspace path shared by every step container of a job.
pub const REPO_PATH: &str = "/tedium/repo";

/// A chore step materialised for the executor: labelled, with its
/// environment fully resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExecutionStep {
    /// `step-1`, `step-2`, ... — also the container name inside the sandbox.
    pub label: String,
    pub image: String,
    pub command: String,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub environment: HashMap<String, String>,
}

/// One item of work: a specific chore on a specific repo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Job {
    pub config: TediumConfig,
    pub repo: Repo,
    pub chore: ChoreSpec,
    pub platform_config: PlatformConfig,

    /// Throwaway branch where the chore stages its output; unique per job.
    pub work_branch_name: String,

    /// Deterministic branch backing the pull request.
    pub final_branch_name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub execution_steps: Vec<ExecutionStep>,
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("error encoding job into environment variable: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("error decoding job: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("{ENV_JOB} is not set")]
    MissingEnvelope,
}

impl Job {
    /// Environment variables that carry this job into an execution step.
    pub fn to_environment(&self) -> Result<HashMap<String, String>, JobError> {
        let encoded = serde_json::to_string(self).map_err(JobError::Encode)?;

        let mut env = HashMap::new();
        env.insert(ENV_JOB.to_string(), encoded);
        Ok(env)
    }

    /// Strictly decode a job from its JSON encoding. Unknown fields fail, so
    /// producer and consumer schemas can never drift apart silently.
    pub fn decode(encoded: &str) -> Result<Self, JobError> {
        serde_json::from_str(encoded).map_err(JobError::Decode)
    }

    /// Reconstruct the job inside a sandbox stage from `TEDIUM_JOB`.
    pub fn from_environment() -> Result<Self, JobError> {
        let encoded = std::env::var(ENV_JOB).map_err(|_| JobError::MissingEnvelope)?;
        Self::decode(&encoded)
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
