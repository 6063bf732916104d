// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job planner: turns a chore into executable steps.
//!
//! Tedium wraps every chore with its own stages: a clone step before the
//! user's steps and a finalise step after them, both running this same
//! binary inside the sandbox with the job envelope in their environment.
//! Each step's environment is then projected: carrier variables first, the
//! step's own variables next, and the user's per-chore variables last —
//! with the `TEDIUM_*` namespace reserved for internal steps.

use std::collections::HashMap;
use tedium_core::{ChoreStep, ExecutionStep, Job, JobError};
use tedium_platforms::Platform;

/// Where the Tedium binary lives inside its container image.
pub const TEDIUM_BINARY: &str = "/usr/local/bin/tedium";

/// Materialise the job's execution steps in place.
pub fn prepare_job(platform: &dyn Platform, job: &mut Job) -> Result<(), JobError> {
    let envelope = job.to_environment()?;
    let tedium_image = job.config.images.tedium.clone();

    if !job.chore.skip_clone_step {
        job.chore.steps.insert(
            0,
            ChoreStep {
                image: tedium_image.clone(),
                command: format!("{TEDIUM_BINARY} init-chore"),
                environment: envelope.clone(),
                internal: true,
            },
        );
    }

    if !job.chore.skip_finalise_step {
        job.chore.steps.push(ChoreStep {
            image: tedium_image,
            command: format!("{TEDIUM_BINARY} finalise-chore"),
            environment: envelope,
            internal: true,
        });
    }

    let steps: Vec<ExecutionStep> = job
        .chore
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| ExecutionStep {
            label: format!("step-{}", index + 1),
            image: step.image.clone(),
            command: step.command.clone(),
            environment: env_for_step(platform, job, step),
        })
        .collect();
    job.execution_steps = steps;

    Ok(())
}

/// The fully-projected environment for one step.
fn env_for_step(
    platform: &dyn Platform,
    job: &Job,
    step: &ChoreStep,
) -> HashMap<String, String> {
    let mut env = HashMap::new();

    // used by the step shell directly
    env.insert("TEDIUM_COMMAND".to_string(), step.command.clone());

    // convenience variables for chore steps
    env.insert("TEDIUM_REPO_OWNER".to_string(), job.repo.owner.clone());
    env.insert("TEDIUM_REPO_NAME".to_string(), job.repo.name.clone());
    env.insert("TEDIUM_REPO_CLONE_URL".to_string(), job.repo.clone_url.clone());
    env.insert("TEDIUM_REPO_DEFAULT_BRANCH".to_string(), job.repo.default_branch.clone());
    env.insert(
        "TEDIUM_PLATFORM_TYPE".to_string(),
        platform.config().platform_type.to_string(),
    );
    env.insert("TEDIUM_PLATFORM_DOMAIN".to_string(), platform.config().domain.clone());
    env.insert("TEDIUM_PLATFORM_API_BASE_URL".to_string(), platform.api_base_url());
    env.insert("TEDIUM_PLATFORM_EMAIL".to_string(), platform.profile().email);

    let source_config = job.chore.source_config.as_ref();
    if source_config.is_some_and(|source| source.expose_platform_token) {
        env.insert("TEDIUM_PLATFORM_TOKEN".to_string(), platform.auth_token());
    }

    for (key, value) in &step.environment {
        if !step.internal && key.starts_with("TEDIUM_") {
            tracing::warn!(%key, "not passing environment variable to chore step");
        } else {
            env.insert(key.clone(), value.clone());
        }
    }

    if let Some(source) = source_config {
        for (key, value) in &source.environment {
            if key.starts_with("TEDIUM_") {
                tracing::warn!(%key, "not passing environment variable to chore step");
            } else {
                env.insert(key.clone(), value.clone());
            }
        }
    }

    env
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;
