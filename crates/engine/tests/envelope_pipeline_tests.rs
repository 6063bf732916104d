// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end planning test: a sweep produces jobs whose envelope, as seen
//! by the in-sandbox stages, reconstructs everything those stages consume.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tedium_core::{ExecutorConfig, Job, PodmanExecutorConfig, TediumConfig};
use tedium_engine::{run_with, RunStats};
use tedium_executors::{Executor, ExecutorError};
use tedium_platforms::test_support::FakePlatform;
use tedium_platforms::{Platform, PlatformRegistry};

#[derive(Default)]
struct CapturingExecutor {
    jobs: Mutex<Vec<Job>>,
}

#[async_trait]
impl Executor for CapturingExecutor {
    async fn init(&mut self, _conf: &TediumConfig) -> Result<(), ExecutorError> {
        Ok(())
    }

    async fn deinit(&self) -> Result<(), ExecutorError> {
        Ok(())
    }

    async fn execute_chore(&self, job: &Job) -> Result<(), ExecutorError> {
        self.jobs.lock().push(job.clone());
        Ok(())
    }
}

#[tokio::test]
async fn sandbox_stages_can_rebuild_their_job_from_the_envelope() {
    let platform = FakePlatform::new("git.example.com");
    let target = platform.repo("acme", "widgets");
    let platform = platform
        .with_repo(target)
        .with_file(
            "acme/widgets",
            ".tedium.yml",
            r#"
chores:
  - url: https://git.example.com/acme/chores.git
    directory: update-hooks
    exposePlatformToken: true
"#,
        )
        .with_file(
            "acme/chores",
            "update-hooks/chore.yml",
            r#"
name: Update hooks
conventionalType: fix
steps:
  - image: alpine
    command: update-hooks --write
"#,
        );

    let conf = TediumConfig {
        executor: ExecutorConfig {
            podman: Some(PodmanExecutorConfig::default()),
            kubernetes: None,
        },
        platforms: vec![platform.config().clone()],
        extra_auth: Vec::new(),
        images: Default::default(),
        auto_enrollment: Default::default(),
        chore_concurrency: 1,
    };

    let mut registry = PlatformRegistry::default();
    registry.insert(Arc::new(platform)).unwrap();

    let executor = Arc::new(CapturingExecutor::default());
    run_with(
        conf,
        Arc::new(registry),
        executor.clone() as Arc<dyn Executor>,
        Arc::new(RunStats::default()),
    )
    .await
    .unwrap();

    let jobs = executor.jobs.lock();
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];

    // the first and last steps are tedium's own, carrying the envelope
    let clone_step = &job.execution_steps[0];
    let finalise_step = &job.execution_steps[job.execution_steps.len() - 1];

    for step in [clone_step, finalise_step] {
        let decoded = Job::decode(&step.environment["TEDIUM_JOB"]).unwrap();

        // everything init-chore needs
        assert_eq!(decoded.repo, job.repo);
        assert_eq!(decoded.work_branch_name, job.work_branch_name);

        // everything finalise-chore needs
        assert_eq!(decoded.final_branch_name, job.final_branch_name);
        assert_eq!(decoded.platform_config, job.platform_config);
        assert_eq!(decoded.chore.commit_message(), "fix: Update hooks");
        assert_eq!(decoded.config, job.config);
    }

    // the user step sees the exposed token but not the envelope
    let user_step = &job.execution_steps[1];
    assert_eq!(user_step.environment["TEDIUM_PLATFORM_TOKEN"], "fake-token");
    assert!(!user_step.environment.contains_key("TEDIUM_JOB"));
}
