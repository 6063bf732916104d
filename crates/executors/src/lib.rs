// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tedium-executors: sandbox backends that run a job's container pipeline.
//!
//! Two executors share one contract: run the job's execution steps in strict
//! order on a workspace volume mounted at `/tedium/repo`, observe each step's
//! exit code before starting the next, and clean up whatever they created.
//! The Podman executor runs a container per step; the Kubernetes executor
//! runs the whole pipeline inside one pod by patching step images over a
//! placeholder.

pub mod kubernetes;
pub mod logs;
pub mod planner;
pub mod podman;

pub use kubernetes::KubernetesExecutor;
pub use logs::LogPrinter;
pub use planner::prepare_job;
pub use podman::PodmanExecutor;

use async_trait::async_trait;
use tedium_core::{ExecutorConfig, Job, TediumConfig};
use thiserror::Error;

/// Every step container runs this instead of the step command directly: the
/// command travels in `TEDIUM_COMMAND`, so image swaps never have to touch a
/// container's command or args.
pub const STEP_SHELL: [&str; 2] = ["/bin/sh", "-c"];
pub const STEP_SHELL_COMMAND: &str = "echo \"${TEDIUM_COMMAND}\" | /bin/sh";

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("no executor specified")]
    NoExecutor,
    #[error("executor is not initialised")]
    NotInitialised,
    #[error("io error running podman: {0}")]
    Io(#[from] std::io::Error),
    #[error("podman {args} failed: {stderr}")]
    Podman { args: String, stderr: String },
    #[error("error parsing container exit code '{0}'")]
    ExitCode(String),
    #[error("kubernetes api error: {0}")]
    Kube(#[from] kube::Error),
    #[error("error loading kubeconfig: {0}")]
    Kubeconfig(String),
    #[error("error building image-swap patch: {0}")]
    Patch(#[from] serde_json::Error),
    #[error("container '{container}' finished with a non-zero exit code: {exit_code}")]
    StepFailed { container: String, exit_code: i32 },
    #[error("timed out waiting for container '{container}' to complete")]
    WaitTimeout { container: String },
}

/// A sandbox backend. Created cheaply from config; `init` establishes the
/// actual connection.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn init(&mut self, conf: &TediumConfig) -> Result<(), ExecutorError>;

    /// Best-effort sweep of any resources a job's own cleanup missed.
    async fn deinit(&self) -> Result<(), ExecutorError>;

    /// Run every execution step of the job, in order, failing on the first
    /// non-zero exit code.
    async fn execute_chore(&self, job: &Job) -> Result<(), ExecutorError>;
}

/// Build the executor selected in config. Config validation has already
/// guaranteed exactly one backend is present.
pub fn from_config(
    executor_config: &ExecutorConfig,
    printer: LogPrinter,
) -> Result<Box<dyn Executor>, ExecutorError> {
    if let Some(podman) = &executor_config.podman {
        return Ok(Box::new(PodmanExecutor::from_config(podman, printer)));
    }
    if let Some(kubernetes) = &executor_config.kubernetes {
        return Ok(Box::new(KubernetesExecutor::from_config(kubernetes, printer)));
    }
    Err(ExecutorError::NoExecutor)
}
