// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Podman executor.
//!
//! Runs one container per execution step, all sharing a named volume
//! mounted at `/tedium/repo`. Containers and volumes are tracked in a
//! ledger so cleanup can run per job and again at deinit for anything a
//! failed job left behind.

use crate::logs::LogPrinter;
use crate::{Executor, ExecutorError, STEP_SHELL, STEP_SHELL_COMMAND};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::process::Stdio;
use std::time::Duration;
use tedium_core::{names, ExecutionStep, Job, PodmanExecutorConfig, TediumConfig, REPO_PATH};
use tokio::process::Command;

/// Container logs can lag slightly behind the exit state.
const LOG_SETTLE: Duration = Duration::from_secs(2);

pub struct PodmanExecutor {
    socket_path: Option<String>,
    printer: LogPrinter,

    // every created resource, removed again after successful cleanup
    containers: Mutex<Vec<String>>,
    volumes: Mutex<Vec<String>>,
}

impl PodmanExecutor {
    pub fn from_config(config: &PodmanExecutorConfig, printer: LogPrinter) -> Self {
        Self {
            socket_path: config.socket_path.clone(),
            printer,
            containers: Mutex::new(Vec::new()),
            volumes: Mutex::new(Vec::new()),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new("podman");
        if let Some(socket) = &self.socket_path {
            command.arg("--url").arg(socket);
        }
        command.args(args);
        command.stdin(Stdio::null());
        command
    }

    /// Run a podman command and return stdout on success.
    async fn run_podman(&self, args: &[&str]) -> Result<String, ExecutorError> {
        let output = self.command(args).output().await?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(ExecutorError::Podman {
                args: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    async fn podman_succeeds(&self, args: &[&str]) -> Result<bool, ExecutorError> {
        let status = self
            .command(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;
        Ok(status.success())
    }

    async fn pull_image_if_absent(&self, image: &str) -> Result<(), ExecutorError> {
        if self.podman_succeeds(&["image", "exists", image]).await? {
            tracing::debug!(%image, "image already exists - not pulling");
            return Ok(());
        }

        tracing::info!(%image, "pulling container image");
        self.run_podman(&["pull", "--quiet", image]).await?;
        Ok(())
    }

    async fn create_volume(&self) -> Result<String, ExecutorError> {
        let name = names::unique_name("repo");
        self.run_podman(&["volume", "create", &name]).await?;
        self.volumes.lock().push(name.clone());
        Ok(name)
    }

    /// Run one step container to completion and print its logs.
    async fn run_step(
        &self,
        name: &str,
        volume: &str,
        step: &ExecutionStep,
    ) -> Result<(), ExecutorError> {
        self.pull_image_if_absent(&step.image).await?;

        let args = create_container_args(name, volume, step);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run_podman(&arg_refs).await?;

        tracing::info!(container = %name, "starting container");
        self.run_podman(&["start", name]).await?;

        let raw_exit_code = self
            .run_podman(&["wait", "--condition", "stopped", "--condition", "exited", name])
            .await?;
        let exit_code: i32 = raw_exit_code
            .trim()
            .parse()
            .map_err(|_| ExecutorError::ExitCode(raw_exit_code.clone()))?;
        tracing::info!(container = %name, exit_code, "container finished");

        // wait for logs to finish - there can be a slight lag
        tokio::time::sleep(LOG_SETTLE).await;

        match self.container_logs(name).await {
            Ok(logs) => self.printer.print_block(name, &logs),
            Err(e) => tracing::error!(container = %name, error = %e, "failed to print container logs"),
        }

        if exit_code != 0 {
            return Err(ExecutorError::StepFailed { container: name.to_string(), exit_code });
        }

        Ok(())
    }

    /// A container's combined stdout and stderr.
    async fn container_logs(&self, name: &str) -> Result<String, ExecutorError> {
        let output = self.command(&["logs", name]).output().await?;

        if !output.status.success() {
            return Err(ExecutorError::Podman {
                args: format!("logs {name}"),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let mut logs = String::from_utf8_lossy(&output.stdout).to_string();
        logs.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(logs)
    }

    async fn cleanup_container(&self, name: &str) {
        match self.run_podman(&["container", "inspect", "--format", "{{.State.Running}}", name]).await
        {
            Ok(state) if state == "true" => {
                tracing::warn!(container = %name, "cleaning up a container that is still running - this is bad!");
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(container = %name, error = %e, "container inspect before cleanup failed"),
        }

        match self.run_podman(&["rm", "--force", name]).await {
            Ok(_) => self.containers.lock().retain(|c| c != name),
            Err(e) => tracing::error!(container = %name, error = %e, "error deleting container"),
        }
    }

    async fn cleanup_volume(&self, name: &str) {
        match self.run_podman(&["volume", "rm", "--force", name]).await {
            Ok(_) => self.volumes.lock().retain(|v| v != name),
            Err(e) => tracing::error!(volume = %name, error = %e, "error deleting volume"),
        }
    }
}

/// The `podman create` arguments for one step container.
fn create_container_args(name: &str, volume: &str, step: &ExecutionStep) -> Vec<String> {
    let mut args = vec![
        "create".to_string(),
        "--name".to_string(),
        name.to_string(),
        "--volume".to_string(),
        format!("{volume}:{REPO_PATH}"),
    ];

    // sorted for a stable argument order
    let mut env: Vec<(&String, &String)> = step.environment.iter().collect();
    env.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in env {
        args.push("--env".to_string());
        args.push(format!("{key}={value}"));
    }

    args.push(step.image.clone());
    args.extend(STEP_SHELL.iter().map(|s| s.to_string()));
    args.push(STEP_SHELL_COMMAND.to_string());
    args
}

#[async_trait]
impl Executor for PodmanExecutor {
    async fn init(&mut self, _conf: &TediumConfig) -> Result<(), ExecutorError> {
        // connection state is per-invocation; nothing to establish up front
        Ok(())
    }

    async fn deinit(&self) -> Result<(), ExecutorError> {
        let leftover_containers: Vec<String> = self.containers.lock().clone();
        for name in leftover_containers {
            self.cleanup_container(&name).await;
        }

        let leftover_volumes: Vec<String> = self.volumes.lock().clone();
        for name in leftover_volumes {
            self.cleanup_volume(&name).await;
        }

        Ok(())
    }

    async fn execute_chore(&self, job: &Job) -> Result<(), ExecutorError> {
        let volume = self.create_volume().await?;
        let mut created: Vec<String> = Vec::new();

        let result = async {
            for step in &job.execution_steps {
                let name = names::unique_name(&step.label);
                created.push(name.clone());
                self.containers.lock().push(name.clone());
                self.run_step(&name, &volume, step).await?;
            }
            Ok(())
        }
        .await;

        // cleanup runs on every exit path
        for name in &created {
            self.cleanup_container(name).await;
        }
        self.cleanup_volume(&volume).await;

        result
    }
}

#[cfg(test)]
#[path = "podman_tests.rs"]
mod tests;
