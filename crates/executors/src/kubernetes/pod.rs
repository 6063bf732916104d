// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pod spec construction and step-completion inspection.

use crate::{STEP_SHELL, STEP_SHELL_COMMAND};
use k8s_openapi::api::core::v1::{
    Container, EmptyDirVolumeSource, EnvVar, Pod, PodSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::HashMap;
use tedium_core::{ExecutionStep, REPO_PATH};

const REPO_VOLUME: &str = "repo";

/// Build the execution pod: one container per step, every one of them
/// running the pause image until its step is patched in.
pub fn build_pod(
    name: &str,
    namespace: &str,
    pause_image: &str,
    steps: &[ExecutionStep],
) -> Pod {
    let containers = steps
        .iter()
        .map(|step| Container {
            name: step.label.clone(),
            image: Some(pause_image.to_string()),
            image_pull_policy: Some("Always".to_string()),
            env: Some(env_from_map(&step.environment)),
            command: Some(STEP_SHELL.iter().map(|s| s.to_string()).collect()),
            args: Some(vec![STEP_SHELL_COMMAND.to_string()]),
            volume_mounts: Some(vec![VolumeMount {
                name: REPO_VOLUME.to_string(),
                mount_path: REPO_PATH.to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        })
        .collect();

    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(
                [
                    ("app.kubernetes.io/name".to_string(), "tedium".to_string()),
                    ("app.kubernetes.io/component".to_string(), "executor".to_string()),
                ]
                .into_iter()
                .collect(),
            ),
            ..Default::default()
        },
        spec: Some(PodSpec {
            restart_policy: Some("Never".to_string()),
            termination_grace_period_seconds: Some(0),
            containers,
            volumes: Some(vec![Volume {
                name: REPO_VOLUME.to_string(),
                empty_dir: Some(EmptyDirVolumeSource::default()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// The JSON patch that swaps one container's image to its step image.
pub fn image_swap_patch(container_index: usize, image: &str) -> serde_json::Value {
    serde_json::json!([
        {
            "op": "replace",
            "path": format!("/spec/containers/{container_index}/image"),
            "value": image,
        }
    ])
}

/// The exit code of a completed step container, if it has completed.
///
/// Completion requires a reported status whose image is no longer the pause
/// image (the swap has been applied) AND a terminated state. The image check
/// matters: a pause container never terminates in normal flow, but a
/// terminated pause state must not be mistaken for the step finishing.
pub fn step_exit_code(pod: &Pod, container_index: usize, pause_image: &str) -> Option<i32> {
    let status = pod.status.as_ref()?.container_statuses.as_ref()?.get(container_index)?;

    if status.image == pause_image {
        // still running the pause image - the step image hasn't been applied
        return None;
    }

    let terminated = status.state.as_ref()?.terminated.as_ref()?;
    Some(terminated.exit_code)
}

fn env_from_map(map: &HashMap<String, String>) -> Vec<EnvVar> {
    // sorted for a stable spec
    let mut env: Vec<EnvVar> = map
        .iter()
        .map(|(name, value)| EnvVar {
            name: name.clone(),
            value: Some(value.clone()),
            ..Default::default()
        })
        .collect();
    env.sort_by(|a, b| a.name.cmp(&b.name));
    env
}

#[cfg(test)]
#[path = "pod_tests.rs"]
mod tests;
