// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::chore::{ChoreStep, RepoChoreConfig};
use crate::config::{ExecutorConfig, PodmanExecutorConfig};
use crate::platform::{AuthConfig, PlatformType};
use crate::repo::CloneAuth;

pub(crate) fn fixture_job() -> Job {
    let platform_config = PlatformConfig {
        platform_type: PlatformType::Gitea,
        domain: "git.example.com".to_string(),
        auth: Some(AuthConfig::UserToken { token: "tok".to_string() }),
        repo_filters: vec!["acme/.*".to_string()],
        skip_discovery: false,
    };

    let config = TediumConfig {
        executor: ExecutorConfig {
            podman: Some(PodmanExecutorConfig { socket_path: None }),
            kubernetes: None,
        },
        platforms: vec![platform_config.clone()],
        extra_auth: Vec::new(),
        images: Default::default(),
        auto_enrollment: Default::default(),
        chore_concurrency: 2,
    };

    let repo = Repo {
        domain: "git.example.com".to_string(),
        owner: "acme".to_string(),
        name: "widgets".to_string(),
        clone_url: "https://git.example.com/acme/widgets.git".to_string(),
        clone_auth: Some(CloneAuth::access_token("tok")),
        default_branch: "main".to_string(),
        archived: false,
    };

    let chore = ChoreSpec {
        name: "Update hooks".to_string(),
        description: Some("Keeps hooks current.".to_string()),
        conventional_type: Some("chore".to_string()),
        steps: vec![ChoreStep {
            image: "docker.io/library/alpine:latest".to_string(),
            command: "update-hooks --write".to_string(),
            environment: [("HOOKS_DIR".to_string(), ".hooks".to_string())].into(),
            internal: false,
        }],
        skip_clone_step: false,
        skip_finalise_step: false,
        source_config: Some(RepoChoreConfig {
            url: "https://git.example.com/acme/chores.git".to_string(),
            directory: "update-hooks".to_string(),
            branch: None,
            environment: Default::default(),
            expose_platform_token: false,
        }),
    };

    Job {
        config,
        repo,
        chore,
        platform_config,
        work_branch_name: "tedium-work-ab12cd34".to_string(),
        final_branch_name: "tedium/update-hooks".to_string(),
        execution_steps: Vec::new(),
    }
}

#[test]
fn envelope_round_trips() {
    let job = fixture_job();
    let env = job.to_environment().unwrap();
    let decoded = Job::decode(&env[ENV_JOB]).unwrap();
    assert_eq!(decoded, job);
}

#[test]
fn envelope_round_trips_with_execution_steps() {
    let mut job = fixture_job();
    job.execution_steps = vec![ExecutionStep {
        label: "step-1".to_string(),
        image: "alpine".to_string(),
        command: "true".to_string(),
        environment: [("TEDIUM_COMMAND".to_string(), "true".to_string())].into(),
    }];

    let env = job.to_environment().unwrap();
    let decoded = Job::decode(&env[ENV_JOB]).unwrap();
    assert_eq!(decoded, job);
}

#[test]
fn decode_is_strict() {
    let job = fixture_job();
    let encoded = serde_json::to_string(&job).unwrap();

    // splice an unknown field into the top level
    let with_extra = encoded.replacen('{', "{\"newField\":1,", 1);
    assert!(matches!(Job::decode(&with_extra), Err(JobError::Decode(_))));
}

#[test]
fn envelope_contains_only_the_job_blob() {
    let job = fixture_job();
    let env = job.to_environment().unwrap();
    assert_eq!(env.len(), 1);
    assert!(env.contains_key(ENV_JOB));
}
