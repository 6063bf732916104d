// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The last in-sandbox stage: commit whatever the chore changed, compare
//! the work branch against the final branch, and push + raise a PR only
//! when there is genuinely something new. Runs as `tedium finalise-chore`
//! inside the last step container.

use crate::EngineError;
use std::path::Path;
use tedium_core::Job;
use tedium_platforms::Platform;

pub async fn finalise_chore() -> Result<(), EngineError> {
    let job = Job::from_environment()?;

    let mut platform = tedium_platforms::from_config(&job.platform_config)?;
    platform.init(&job.config).await?;

    finalise_chore_for(&job, platform.as_ref(), Path::new(tedium_git::REPO_PATH)).await
}

/// The stage body, with the platform and workspace path injected for tests.
pub async fn finalise_chore_for(
    job: &Job,
    platform: &dyn Platform,
    repo_dir: &Path,
) -> Result<(), EngineError> {
    let changed_this_run = tedium_git::commit_if_changed(
        repo_dir,
        &job.chore.commit_message(),
        &platform.profile().email,
    )
    .await?;

    if !changed_this_run {
        tracing::info!("chore did not modify the repo");
        return Ok(());
    }

    let changed_since_previous_runs = tedium_git::work_branch_differs_from_final_branch(
        repo_dir,
        &job.work_branch_name,
        &job.final_branch_name,
    )
    .await?;

    if !changed_since_previous_runs {
        tracing::info!("identical changes have already been pushed, no need to overwrite them");
        return Ok(());
    }

    tedium_git::push_work_branch_to_final_branch(
        repo_dir,
        &job.work_branch_name,
        &job.final_branch_name,
    )
    .await?;

    platform.open_or_update_pull_request(job).await?;

    Ok(())
}
