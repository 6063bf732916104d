// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubernetes executor — one pod per job, image swap per step.
//!
//! # Module layout
//!
//! - [`pod`] — pod spec construction and step-completion inspection
//!
//! # Architecture
//!
//! A job's steps are heterogeneous images that must share a workspace, and
//! the step images are only known at planning time. Instead of building an
//! init-container chain, the executor creates a single pod with one
//! container per step, every one of them running the pause image, which does
//! nothing and stays alive. Each container already carries its step's full
//! environment (including `TEDIUM_COMMAND`) and the fixed shell invocation
//! that reads it.
//!
//! The pause image reserves the container slot: the pod exists and the
//! `repo` volume is mounted before any step image is pulled. Running a step
//! is then a single JSON patch replacing that container's image. Kubernetes
//! restarts the container with the new image, the shell reads
//! `TEDIUM_COMMAND`, and the container terminates with the step's exit code.
//! Container index equals step index, which gives a total order.

pub mod pod;

use crate::logs::LogPrinter;
use crate::{Executor, ExecutorError};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DeleteParams, LogParams, Patch, PatchParams, PostParams};
use kube::Client;
use std::time::Duration;
use tedium_core::{names, Job, KubernetesExecutorConfig, TediumConfig};
use tokio::time::Instant;

/// Completion polling cadence and budget per step.
const WAIT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const WAIT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

pub struct KubernetesExecutor {
    kubeconfig_path: Option<String>,
    namespace: String,
    printer: LogPrinter,

    // populated by init
    pause_image: String,
    pods: Option<Api<Pod>>,
}

impl KubernetesExecutor {
    pub fn from_config(config: &KubernetesExecutorConfig, printer: LogPrinter) -> Self {
        let namespace = match &config.namespace {
            Some(namespace) if !namespace.is_empty() => namespace.clone(),
            _ => {
                tracing::warn!("kubernetes executor namespace was blank - using 'default'");
                "default".to_string()
            }
        };

        Self {
            kubeconfig_path: config.kubeconfig_path.clone(),
            namespace,
            printer,
            pause_image: String::new(),
            pods: None,
        }
    }

    fn pods(&self) -> Result<&Api<Pod>, ExecutorError> {
        self.pods.as_ref().ok_or(ExecutorError::NotInitialised)
    }

    async fn build_client(&self) -> Result<Client, ExecutorError> {
        match &self.kubeconfig_path {
            Some(path) => {
                let kubeconfig = kube::config::Kubeconfig::read_from(path)
                    .map_err(|e| ExecutorError::Kubeconfig(e.to_string()))?;
                let options = kube::config::KubeConfigOptions::default();
                let config = kube::Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .map_err(|e| ExecutorError::Kubeconfig(e.to_string()))?;
                Ok(Client::try_from(config)?)
            }
            None => {
                tracing::info!("no kubeconfig path provided - using inferred config");
                Ok(Client::try_default()
                    .await
                    .map_err(|e| ExecutorError::Kubeconfig(e.to_string()))?)
            }
        }
    }

    /// Drive each step by patching its container's image, then waiting for
    /// that container to terminate.
    async fn run_steps(&self, pod_name: &str, job: &Job) -> Result<(), ExecutorError> {
        let pods = self.pods()?;

        for (index, step) in job.execution_steps.iter().enumerate() {
            tracing::info!(step = %step.label, "starting step");

            let patch = serde_json::from_value(pod::image_swap_patch(index, &step.image))?;
            pods.patch(pod_name, &PatchParams::default(), &Patch::Json::<()>(patch)).await?;

            let exit_code = self.wait_for_container_completion(pod_name, index, &step.label).await?;

            let log_params = LogParams { container: Some(step.label.clone()), ..LogParams::default() };
            match pods.logs(pod_name, &log_params).await {
                Ok(logs) => self.printer.print_block(&step.label, &logs),
                Err(e) => {
                    tracing::error!(container = %step.label, error = %e, "failed to print container logs")
                }
            }

            if exit_code != 0 {
                return Err(ExecutorError::StepFailed {
                    container: step.label.clone(),
                    exit_code,
                });
            }
        }

        Ok(())
    }

    /// Poll until the step container has restarted off the pause image and
    /// terminated, returning its exit code.
    async fn wait_for_container_completion(
        &self,
        pod_name: &str,
        container_index: usize,
        label: &str,
    ) -> Result<i32, ExecutorError> {
        let pods = self.pods()?;
        let deadline = Instant::now() + WAIT_TIMEOUT;

        loop {
            let pod = pods.get(pod_name).await?;
            if let Some(exit_code) = pod::step_exit_code(&pod, container_index, &self.pause_image) {
                return Ok(exit_code);
            }

            if Instant::now() >= deadline {
                return Err(ExecutorError::WaitTimeout { container: label.to_string() });
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl Executor for KubernetesExecutor {
    async fn init(&mut self, conf: &TediumConfig) -> Result<(), ExecutorError> {
        self.pause_image = conf.images.pause.clone();

        let client = self.build_client().await?;
        self.pods = Some(Api::namespaced(client, &self.namespace));
        Ok(())
    }

    async fn deinit(&self) -> Result<(), ExecutorError> {
        Ok(())
    }

    async fn execute_chore(&self, job: &Job) -> Result<(), ExecutorError> {
        let pods = self.pods()?;

        let pod_name = names::unique_name("executor");
        let pod_spec =
            pod::build_pod(&pod_name, &self.namespace, &self.pause_image, &job.execution_steps);

        tracing::info!(pod = %pod_name, namespace = %self.namespace, "creating execution pod");
        pods.create(&PostParams::default(), &pod_spec).await?;

        let result = self.run_steps(&pod_name, job).await;

        // stale pods are a correctness hazard: delete on every exit path
        if let Err(e) = pods.delete(&pod_name, &DeleteParams::default()).await {
            tracing::error!(pod = %pod_name, error = %e, "error deleting execution pod");
        }

        result
    }
}
