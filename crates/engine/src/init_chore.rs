// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The first in-sandbox stage: clone the target repo and check out the
//! job's work branch. Runs as `tedium init-chore` inside the first step
//! container, reconstructing its job from the envelope.

use crate::EngineError;
use std::path::Path;
use tedium_core::Job;

pub async fn init_chore() -> Result<(), EngineError> {
    let job = Job::from_environment()?;
    init_chore_for(&job, Path::new(tedium_git::REPO_PATH)).await
}

/// The stage body, with the workspace path injected for tests.
pub async fn init_chore_for(job: &Job, repo_dir: &Path) -> Result<(), EngineError> {
    tedium_git::clone_repo(repo_dir, &job.repo).await?;
    tedium_git::checkout_work_branch(repo_dir, &job.work_branch_name).await?;
    Ok(())
}
