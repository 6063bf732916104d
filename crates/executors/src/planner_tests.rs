// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tedium_core::{ChoreSpec, ExecutorConfig, PodmanExecutorConfig, RepoChoreConfig, TediumConfig};
use tedium_platforms::test_support::FakePlatform;

const ALLOWED_TEDIUM_VARS: &[&str] = &[
    "TEDIUM_COMMAND",
    "TEDIUM_REPO_OWNER",
    "TEDIUM_REPO_NAME",
    "TEDIUM_REPO_CLONE_URL",
    "TEDIUM_REPO_DEFAULT_BRANCH",
    "TEDIUM_PLATFORM_TYPE",
    "TEDIUM_PLATFORM_DOMAIN",
    "TEDIUM_PLATFORM_API_BASE_URL",
    "TEDIUM_PLATFORM_EMAIL",
    "TEDIUM_PLATFORM_TOKEN",
];

fn platform() -> FakePlatform {
    FakePlatform::new("git.example.com")
}

fn job_with_chore(platform: &FakePlatform, chore: ChoreSpec) -> Job {
    let platform_config = platform.config().clone();
    Job {
        config: TediumConfig {
            executor: ExecutorConfig {
                podman: Some(PodmanExecutorConfig::default()),
                kubernetes: None,
            },
            platforms: vec![platform_config.clone()],
            extra_auth: Vec::new(),
            images: Default::default(),
            auto_enrollment: Default::default(),
            chore_concurrency: 1,
        },
        repo: platform.repo("acme", "widgets"),
        chore,
        platform_config,
        work_branch_name: "tedium-work-ab12cd34".to_string(),
        final_branch_name: "tedium/test-chore".to_string(),
        execution_steps: Vec::new(),
    }
}

fn chore(steps: usize) -> ChoreSpec {
    ChoreSpec {
        name: "Test chore".to_string(),
        steps: (0..steps)
            .map(|i| ChoreStep {
                image: "alpine".to_string(),
                command: format!("echo step {i}"),
                environment: Default::default(),
                internal: false,
            })
            .collect(),
        source_config: Some(RepoChoreConfig {
            url: "https://git.example.com/acme/chores.git".to_string(),
            directory: "test-chore".to_string(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[test]
fn wraps_user_steps_with_clone_and_finalise() {
    let platform = platform();
    let mut job = job_with_chore(&platform, chore(2));
    prepare_job(&platform, &mut job).unwrap();

    assert_eq!(job.execution_steps.len(), 4);
    let labels: Vec<&str> = job.execution_steps.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["step-1", "step-2", "step-3", "step-4"]);

    let first = &job.execution_steps[0];
    assert_eq!(first.command, "/usr/local/bin/tedium init-chore");
    assert_eq!(first.image, "ghcr.io/markormesher/tedium:v0");

    let last = &job.execution_steps[3];
    assert_eq!(last.command, "/usr/local/bin/tedium finalise-chore");
    assert_eq!(last.image, "ghcr.io/markormesher/tedium:v0");
}

#[test]
fn skip_flags_drop_the_matching_step() {
    let platform = platform();

    let mut spec = chore(1);
    spec.skip_clone_step = true;
    let mut job = job_with_chore(&platform, spec);
    prepare_job(&platform, &mut job).unwrap();
    assert_eq!(job.execution_steps.len(), 2);
    assert_eq!(job.execution_steps[0].command, "echo step 0");

    let mut spec = chore(1);
    spec.skip_finalise_step = true;
    let mut job = job_with_chore(&platform, spec);
    prepare_job(&platform, &mut job).unwrap();
    assert_eq!(job.execution_steps.len(), 2);
    assert_eq!(job.execution_steps[1].command, "echo step 0");

    let mut spec = chore(1);
    spec.skip_clone_step = true;
    spec.skip_finalise_step = true;
    let mut job = job_with_chore(&platform, spec);
    prepare_job(&platform, &mut job).unwrap();
    assert_eq!(job.execution_steps.len(), 1);
}

#[test]
fn internal_steps_carry_the_job_envelope() {
    let platform = platform();
    let mut job = job_with_chore(&platform, chore(1));
    prepare_job(&platform, &mut job).unwrap();

    let first = &job.execution_steps[0];
    let envelope = &first.environment["TEDIUM_JOB"];
    let decoded = Job::decode(envelope).unwrap();
    assert_eq!(decoded.repo.full_name(), "acme/widgets");
    assert_eq!(decoded.work_branch_name, job.work_branch_name);

    // user steps never see the envelope
    let user_step = &job.execution_steps[1];
    assert!(!user_step.environment.contains_key("TEDIUM_JOB"));
}

#[test]
fn steps_carry_their_command_and_convenience_variables() {
    let platform = platform();
    let mut job = job_with_chore(&platform, chore(1));
    prepare_job(&platform, &mut job).unwrap();

    let env = &job.execution_steps[1].environment;
    assert_eq!(env["TEDIUM_COMMAND"], "echo step 0");
    assert_eq!(env["TEDIUM_REPO_OWNER"], "acme");
    assert_eq!(env["TEDIUM_REPO_NAME"], "widgets");
    assert_eq!(env["TEDIUM_REPO_DEFAULT_BRANCH"], "main");
    assert_eq!(env["TEDIUM_PLATFORM_TYPE"], "gitea");
    assert_eq!(env["TEDIUM_PLATFORM_DOMAIN"], "git.example.com");
    assert_eq!(env["TEDIUM_PLATFORM_API_BASE_URL"], "https://git.example.com/api/v1");
    assert_eq!(env["TEDIUM_PLATFORM_EMAIL"], "bot@example.com");
}

#[test]
fn platform_token_is_only_exposed_when_asked() {
    let platform = platform();

    let mut job = job_with_chore(&platform, chore(1));
    prepare_job(&platform, &mut job).unwrap();
    assert!(!job.execution_steps[1].environment.contains_key("TEDIUM_PLATFORM_TOKEN"));

    let mut spec = chore(1);
    if let Some(source) = spec.source_config.as_mut() {
        source.expose_platform_token = true;
    }
    let mut job = job_with_chore(&platform, spec);
    prepare_job(&platform, &mut job).unwrap();
    assert_eq!(job.execution_steps[1].environment["TEDIUM_PLATFORM_TOKEN"], "fake-token");
}

#[test]
fn user_steps_cannot_claim_the_tedium_namespace() {
    let platform = platform();

    let mut spec = chore(1);
    spec.steps[0]
        .environment
        .insert("TEDIUM_PLATFORM_TOKEN".to_string(), "stolen".to_string());
    spec.steps[0].environment.insert("SAFE_VAR".to_string(), "ok".to_string());
    if let Some(source) = spec.source_config.as_mut() {
        source.environment.insert("TEDIUM_JOB".to_string(), "forged".to_string());
        source.environment.insert("CHORE_VAR".to_string(), "chore".to_string());
    }

    let mut job = job_with_chore(&platform, spec);
    prepare_job(&platform, &mut job).unwrap();

    let env = &job.execution_steps[1].environment;
    assert!(!env.contains_key("TEDIUM_PLATFORM_TOKEN"));
    assert!(!env.contains_key("TEDIUM_JOB"));
    assert_eq!(env["SAFE_VAR"], "ok");
    assert_eq!(env["CHORE_VAR"], "chore");
}

#[test]
fn chore_environment_overlays_step_environment() {
    let platform = platform();

    let mut spec = chore(1);
    spec.steps[0].environment.insert("SHARED".to_string(), "from-step".to_string());
    if let Some(source) = spec.source_config.as_mut() {
        source.environment.insert("SHARED".to_string(), "from-chore".to_string());
    }

    let mut job = job_with_chore(&platform, spec);
    prepare_job(&platform, &mut job).unwrap();
    assert_eq!(job.execution_steps[1].environment["SHARED"], "from-chore");
}

#[test]
fn no_unexpected_tedium_variables_leak_into_user_steps() {
    let platform = platform();
    let mut spec = chore(3);
    if let Some(source) = spec.source_config.as_mut() {
        source.expose_platform_token = true;
    }
    let mut job = job_with_chore(&platform, spec);
    prepare_job(&platform, &mut job).unwrap();

    for step in &job.execution_steps[1..job.execution_steps.len() - 1] {
        for key in step.environment.keys() {
            if key.starts_with("TEDIUM_") {
                assert!(
                    ALLOWED_TEDIUM_VARS.contains(&key.as_str()),
                    "unexpected variable {key} in user step"
                );
            }
        }
    }
}
