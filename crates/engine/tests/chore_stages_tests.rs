// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end tests for the in-sandbox stages, driven against real git
//! repositories in temp directories with a fake platform standing in for
//! the REST API.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tedium_core::{
    names, ChoreSpec, ChoreStep, ExecutorConfig, Job, PodmanExecutorConfig, Repo, TediumConfig,
};
use tedium_engine::finalise_chore::finalise_chore_for;
use tedium_engine::init_chore::init_chore_for;
use tedium_platforms::test_support::FakePlatform;
use tedium_platforms::Platform;

async fn git(dir: &Path, args: &[&str]) -> String {
    let output = tokio::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .await
        .expect("git runs");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

async fn git_ref_exists(dir: &Path, reference: &str) -> bool {
    tokio::process::Command::new("git")
        .args(["rev-parse", "--verify", "--quiet", reference])
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .expect("git runs")
        .success()
}

/// A bare "platform-side" repo seeded with one commit on main.
async fn seed_remote(root: &Path) -> PathBuf {
    let remote = root.join("remote.git");
    let seed = root.join("seed");
    std::fs::create_dir_all(&remote).unwrap();
    std::fs::create_dir_all(&seed).unwrap();

    git(&remote, &["init", "--bare", "--initial-branch=main", "."]).await;
    git(&seed, &["init", "--initial-branch=main", "."]).await;
    std::fs::write(seed.join("README.md"), "# widgets\n").unwrap();
    git(&seed, &["add", "--all"]).await;
    git(&seed, &["-c", "user.name=seed", "-c", "user.email=seed@example.com", "commit", "-m", "initial"]).await;
    let remote_url = remote.display().to_string();
    git(&seed, &["remote", "add", "origin", &remote_url]).await;
    git(&seed, &["push", "origin", "main"]).await;

    remote
}

fn job_for(platform: &FakePlatform, remote: &Path, command: &str) -> Job {
    let chore = ChoreSpec {
        name: "Say hello".to_string(),
        steps: vec![ChoreStep {
            image: "alpine".to_string(),
            command: command.to_string(),
            environment: Default::default(),
            internal: false,
        }],
        ..Default::default()
    };

    Job {
        config: TediumConfig {
            executor: ExecutorConfig {
                podman: Some(PodmanExecutorConfig::default()),
                kubernetes: None,
            },
            platforms: vec![platform.config().clone()],
            extra_auth: Vec::new(),
            images: Default::default(),
            auto_enrollment: Default::default(),
            chore_concurrency: 1,
        },
        repo: Repo {
            domain: platform.config().domain.clone(),
            owner: "acme".to_string(),
            name: "widgets".to_string(),
            clone_url: remote.display().to_string(),
            clone_auth: None,
            default_branch: "main".to_string(),
            archived: false,
        },
        chore,
        platform_config: platform.config().clone(),
        work_branch_name: names::work_branch_name(),
        final_branch_name: names::final_branch_name("Say hello"),
        execution_steps: Vec::new(),
    }
}

#[tokio::test]
async fn chore_with_no_change_skips_commit_push_and_pr() {
    let tmp = tempfile::tempdir().unwrap();
    let remote = seed_remote(tmp.path()).await;
    let platform = FakePlatform::new("git.example.com");

    let job = job_for(&platform, &remote, "true");
    let workspace = tmp.path().join("sandbox/repo");

    init_chore_for(&job, &workspace).await.unwrap();
    // the chore step runs `true`: no change to the worktree
    finalise_chore_for(&job, &platform, &workspace).await.unwrap();

    assert!(platform.pr_calls.lock().is_empty());
    assert!(!git_ref_exists(&remote, "refs/heads/tedium/say-hello").await);
}

#[tokio::test]
async fn chore_with_a_change_commits_pushes_and_raises_a_pr() {
    let tmp = tempfile::tempdir().unwrap();
    let remote = seed_remote(tmp.path()).await;
    let platform = FakePlatform::new("git.example.com");

    let job = job_for(&platform, &remote, "echo hello > hello.txt");
    let workspace = tmp.path().join("sandbox/repo");

    init_chore_for(&job, &workspace).await.unwrap();
    std::fs::write(workspace.join("hello.txt"), "hello\n").unwrap();
    finalise_chore_for(&job, &platform, &workspace).await.unwrap();

    assert_eq!(platform.pr_calls.lock().as_slice(), ["Say hello"]);
    assert!(git_ref_exists(&remote, "refs/heads/tedium/say-hello").await);

    let message = git(&remote, &["log", "-1", "--pretty=%ae|%s", "refs/heads/tedium/say-hello"]).await;
    assert_eq!(message, "bot@example.com|chore: Say hello");
}

#[tokio::test]
async fn identical_rerun_skips_the_push_and_the_pr_update() {
    let tmp = tempfile::tempdir().unwrap();
    let remote = seed_remote(tmp.path()).await;
    let platform = FakePlatform::new("git.example.com");

    // first run pushes the change
    let job = job_for(&platform, &remote, "echo hello > hello.txt");
    let first_workspace = tmp.path().join("sandbox-1/repo");
    init_chore_for(&job, &first_workspace).await.unwrap();
    std::fs::write(first_workspace.join("hello.txt"), "hello\n").unwrap();
    finalise_chore_for(&job, &platform, &first_workspace).await.unwrap();

    let branch_before =
        git(&remote, &["rev-parse", "refs/heads/tedium/say-hello"]).await;

    // second run: a fresh work branch produces the identical tree
    let rerun = job_for(&platform, &remote, "echo hello > hello.txt");
    assert_ne!(rerun.work_branch_name, job.work_branch_name);
    let second_workspace = tmp.path().join("sandbox-2/repo");
    init_chore_for(&rerun, &second_workspace).await.unwrap();
    std::fs::write(second_workspace.join("hello.txt"), "hello\n").unwrap();
    finalise_chore_for(&rerun, &platform, &second_workspace).await.unwrap();

    let branch_after =
        git(&remote, &["rev-parse", "refs/heads/tedium/say-hello"]).await;

    // the commit happened on the new work branch, but the final branch was
    // left alone and the PR was not touched a second time
    assert_eq!(branch_before, branch_after);
    assert_eq!(platform.pr_calls.lock().len(), 1);
}
