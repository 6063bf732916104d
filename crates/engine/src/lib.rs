// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tedium-engine: the orchestration layer.
//!
//! One entrypoint per process role. The driver runs [`orchestrator::run`]:
//! discover repos, resolve their chore lists, and feed jobs to a worker
//! pool. Inside each sandbox, the same binary re-enters through
//! [`init_chore::init_chore`] and [`finalise_chore::finalise_chore`],
//! reconstructing its job from the envelope.

pub mod finalise_chore;
pub mod init_chore;
pub mod orchestrator;
pub mod resolver;
pub mod stats;

pub use orchestrator::{run, run_with};
pub use resolver::resolve_repo_config;
pub use stats::{RunStats, RunStatsSnapshot};

use tedium_core::JobError;
use tedium_executors::ExecutorError;
use tedium_git::GitError;
use tedium_platforms::PlatformError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),
    #[error("executor error: {0}")]
    Executor(#[from] ExecutorError),
    #[error("git error: {0}")]
    Git(#[from] GitError),
    #[error(transparent)]
    Job(#[from] JobError),
    #[error(transparent)]
    Resolve(#[from] resolver::ResolveError),
    #[error("worker task panicked: {0}")]
    WorkerJoin(#[from] tokio::task::JoinError),
    #[error("job queue closed before discovery finished")]
    QueueClosed,
}
