// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn chore(name: &str, conventional_type: Option<&str>) -> ChoreSpec {
    ChoreSpec {
        name: name.to_string(),
        conventional_type: conventional_type.map(str::to_string),
        ..ChoreSpec::default()
    }
}

#[test]
fn commit_message_defaults_to_chore_prefix() {
    assert_eq!(chore("Update hooks", None).commit_message(), "chore: Update hooks");
}

#[test]
fn commit_message_uses_conventional_type() {
    assert_eq!(chore("Bump deps", Some("fix")).commit_message(), "fix: Bump deps");
}

#[test]
fn empty_conventional_type_falls_back() {
    assert_eq!(chore("Bump deps", Some("")).pr_title(), "chore: Bump deps");
}

#[test]
fn pr_body_uses_description() {
    let mut spec = chore("x", None);
    spec.description = Some("Keeps things tidy.".to_string());
    assert_eq!(spec.pr_body(), "Keeps things tidy.");
}

#[test]
fn pr_body_placeholder_when_description_missing() {
    assert_eq!(chore("x", None).pr_body(), "_No description provided by chore_");
    let mut spec = chore("x", None);
    spec.description = Some(String::new());
    assert_eq!(spec.pr_body(), "_No description provided by chore_");
}

#[test]
fn repo_config_parses_from_yaml() {
    let raw = r#"
extends:
  - https://git.example.com/org/common-config
chores:
  - url: https://git.example.com/org/chores
    directory: update-hooks
    branch: stable
    environment:
      LOG_LEVEL: debug
    exposePlatformToken: true
"#;
    let conf: RepoConfig = serde_yaml::from_str(raw).unwrap();
    assert_eq!(conf.extends.len(), 1);
    assert_eq!(conf.chores.len(), 1);

    let chore = &conf.chores[0];
    assert_eq!(chore.merge_key(), ("https://git.example.com/org/chores", "update-hooks"));
    assert_eq!(chore.branch.as_deref(), Some("stable"));
    assert_eq!(chore.environment["LOG_LEVEL"], "debug");
    assert!(chore.expose_platform_token);
}

#[test]
fn repo_config_rejects_unknown_fields() {
    let raw = r#"
chores: []
surprise: true
"#;
    assert!(serde_yaml::from_str::<RepoConfig>(raw).is_err());
}

#[test]
fn chore_spec_parses_from_yaml() {
    let raw = r#"
name: Update hooks
description: Keeps hooks current.
conventionalType: chore
steps:
  - image: docker.io/library/alpine:latest
    command: update-hooks --write
    environment:
      HOOKS_DIR: .hooks
skipCloneStep: false
"#;
    let spec: ChoreSpec = serde_yaml::from_str(raw).unwrap();
    assert_eq!(spec.name, "Update hooks");
    assert_eq!(spec.steps.len(), 1);
    assert!(!spec.steps[0].internal);
    assert_eq!(spec.steps[0].environment["HOOKS_DIR"], ".hooks");
}

#[test]
fn chore_spec_rejects_unknown_fields() {
    let raw = r#"
name: Update hooks
steps: []
totallyNewField: 1
"#;
    assert!(serde_yaml::from_str::<ChoreSpec>(raw).is_err());
}

#[test]
fn chore_step_internal_marker_is_not_deserialised() {
    // "internal" is driver-side state, not part of the file format
    let raw = r#"
image: alpine
command: "true"
internal: true
"#;
    assert!(serde_yaml::from_str::<ChoreStep>(raw).is_err());
}
