// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tedium-git: git operations for the in-sandbox stages.
//!
//! These functions run inside the execution sandbox (the `init-chore` and
//! `finalise-chore` stages), operating on the shared workspace at
//! [`REPO_PATH`]. The driver process never touches a working tree.

use std::path::Path;
use std::process::Stdio;
use tedium_core::Repo;
use thiserror::Error;
use tokio::process::Command;

pub use tedium_core::REPO_PATH;

/// Author name for chore commits; the email comes from the platform profile.
const COMMIT_AUTHOR_NAME: &str = "tedium";

#[derive(Debug, Error)]
pub enum GitError {
    #[error("io error running git: {0}")]
    Io(#[from] std::io::Error),
    #[error("git {args} failed: {stderr}")]
    Command { args: String, stderr: String },
    #[error("refusing to checkout a new branch on an unclean repo")]
    UncleanWorktree,
    #[error("invalid clone url '{url}': {source}")]
    CloneUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("cannot set credentials on clone url '{0}'")]
    CloneUrlAuth(String),
}

/// Run a git command in `dir` and return stdout on success.
async fn run_git(dir: &Path, args: &[&str]) -> Result<String, GitError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .await?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        Err(GitError::Command {
            args: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Like [`run_git`], but only reports whether the command succeeded.
async fn git_succeeds(dir: &Path, args: &[&str]) -> Result<bool, GitError> {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;
    Ok(status.success())
}

/// The repo's clone URL with its basic-auth pair spliced in, so plain `git`
/// commands authenticate without a credential helper.
fn authenticated_clone_url(repo: &Repo) -> Result<String, GitError> {
    let Some(auth) = &repo.clone_auth else {
        return Ok(repo.clone_url.clone());
    };

    let mut parsed = url::Url::parse(&repo.clone_url)
        .map_err(|source| GitError::CloneUrl { url: repo.clone_url.clone(), source })?;
    parsed
        .set_username(&auth.username)
        .and_then(|_| parsed.set_password(Some(&auth.password)))
        .map_err(|_| GitError::CloneUrlAuth(repo.clone_url.clone()))?;

    Ok(parsed.to_string())
}

/// Whether the worktree has no staged or unstaged changes.
async fn worktree_is_clean(dir: &Path) -> Result<bool, GitError> {
    let status = run_git(dir, &["status", "--porcelain"]).await?;
    Ok(status.is_empty())
}

/// Clone the target repo into `dir`, then fetch every remote ref so later
/// branch comparisons see the platform's state.
pub async fn clone_repo(dir: &Path, repo: &Repo) -> Result<(), GitError> {
    tracing::info!(url = %repo.clone_url, "cloning repo");

    if dir.join(".git").exists() {
        tracing::debug!(path = %dir.display(), "repo is already present - doing nothing");
        return Ok(());
    }

    let parent = dir.parent().unwrap_or(Path::new("/"));
    tokio::fs::create_dir_all(parent).await?;

    let clone_url = authenticated_clone_url(repo)?;
    let dir_str = dir.display().to_string();
    run_git(parent, &["clone", &clone_url, &dir_str]).await?;
    fetch_all(dir).await?;

    Ok(())
}

/// Fetch all heads and refs from origin, pruning removed ones.
///
/// `--update-head-ok` lets the mirror refspec refresh the checked-out
/// default branch, which at this point matches the remote anyway.
pub async fn fetch_all(dir: &Path) -> Result<(), GitError> {
    run_git(
        dir,
        &[
            "fetch",
            "--prune",
            "--update-head-ok",
            "origin",
            "+refs/heads/*:refs/remotes/origin/*",
            "+refs/*:refs/*",
        ],
    )
    .await?;
    Ok(())
}

/// Check out the job's work branch, creating it if necessary.
///
/// The worktree must be clean; anything else means something upstream
/// misbehaved, and carrying on would stage unrelated changes into the chore.
pub async fn checkout_work_branch(dir: &Path, branch: &str) -> Result<(), GitError> {
    tracing::info!(%branch, "checking out work branch");

    if !worktree_is_clean(dir).await? {
        return Err(GitError::UncleanWorktree);
    }

    let branch_ref = format!("refs/heads/{branch}");
    let exists = git_succeeds(dir, &["rev-parse", "--verify", "--quiet", &branch_ref]).await?;

    if exists {
        run_git(dir, &["checkout", branch]).await?;
    } else {
        tracing::info!(%branch, "branch does not exist - it will be created");
        run_git(dir, &["checkout", "-b", branch]).await?;
    }

    Ok(())
}

/// Stage and commit everything if the chore changed the worktree.
///
/// Returns false (and does nothing) on a clean tree.
pub async fn commit_if_changed(
    dir: &Path,
    message: &str,
    author_email: &str,
) -> Result<bool, GitError> {
    if worktree_is_clean(dir).await? {
        tracing::info!("chore did not modify the repo");
        return Ok(false);
    }

    tracing::info!(%message, "committing changes");
    run_git(dir, &["add", "--all"]).await?;

    let name_config = format!("user.name={COMMIT_AUTHOR_NAME}");
    let email_config = format!("user.email={author_email}");
    run_git(dir, &["-c", &name_config, "-c", &email_config, "commit", "--message", message])
        .await?;

    Ok(true)
}

/// Whether the work branch's tree differs from the final branch's.
///
/// A missing final branch counts as different (there is something to push).
/// Equal tree hashes mean a re-run produced identical output and the PR
/// branch should be left alone.
pub async fn work_branch_differs_from_final_branch(
    dir: &Path,
    work_branch: &str,
    final_branch: &str,
) -> Result<bool, GitError> {
    let final_ref = format!("refs/remotes/origin/{final_branch}");
    let final_exists = git_succeeds(dir, &["rev-parse", "--verify", "--quiet", &final_ref]).await?;
    if !final_exists {
        return Ok(true);
    }

    let work_tree = run_git(dir, &["rev-parse", &format!("refs/heads/{work_branch}^{{tree}}")])
        .await?;
    let final_tree = run_git(dir, &["rev-parse", &format!("{final_ref}^{{tree}}")]).await?;

    Ok(work_tree != final_tree)
}

/// Force-push the work branch over the final branch. The final branch is
/// Tedium-owned, so overwriting history on it is expected.
pub async fn push_work_branch_to_final_branch(
    dir: &Path,
    work_branch: &str,
    final_branch: &str,
) -> Result<(), GitError> {
    tracing::info!(%work_branch, %final_branch, "pushing work branch to final branch");
    let refspec = format!("+refs/heads/{work_branch}:refs/heads/{final_branch}");
    run_git(dir, &["push", "origin", &refspec]).await?;
    Ok(())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
