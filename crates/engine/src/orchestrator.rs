// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The run orchestrator: discovery → planning → worker-pool dispatch.
//!
//! Discovery runs serially per platform; jobs flow through a bounded queue
//! into a pool of workers. A job failure is counted and logged, never fatal.
//! Platform API failures during discovery abort the run — a
//! partially-discovered sweep is worse than no sweep.

use crate::resolver::resolve_repo_config;
use crate::stats::{RunStats, RunStatsSnapshot};
use crate::EngineError;
use std::sync::Arc;
use tedium_core::{names, Job, TediumConfig};
use tedium_executors::{prepare_job, Executor, LogPrinter};
use tedium_platforms::{Platform, PlatformRegistry};
use tokio::sync::mpsc;

/// Run one full sweep: this is the `tedium run` entrypoint.
pub async fn run(conf: TediumConfig) -> Result<RunStatsSnapshot, EngineError> {
    // setting up the executor is cheap; it doesn't matter if no chores materialise
    tracing::info!("initialising executor");
    let printer = LogPrinter::new();
    let mut executor = tedium_executors::from_config(&conf.executor, printer)?;
    executor.init(&conf).await?;
    let executor: Arc<dyn Executor> = Arc::from(executor);

    // init ALL platforms before trying to use ANY of them
    let mut registry = PlatformRegistry::default();
    for platform_config in &conf.platforms {
        tracing::info!(domain = %platform_config.domain, "initialising platform");
        let mut platform = tedium_platforms::from_config(platform_config)?;
        platform.init(&conf).await?;
        registry.insert(Arc::from(platform))?;
    }
    let registry = Arc::new(registry);

    let stats = Arc::new(RunStats::default());
    let snapshot = run_with(conf, registry, executor, stats).await?;

    tracing::info!(stats = ?snapshot, "run complete");
    Ok(snapshot)
}

/// The orchestration core, with every collaborator injected. Tests drive
/// this directly with fake platforms and a recording executor.
pub async fn run_with(
    conf: TediumConfig,
    registry: Arc<PlatformRegistry>,
    executor: Arc<dyn Executor>,
    stats: Arc<RunStats>,
) -> Result<RunStatsSnapshot, EngineError> {
    let concurrency = conf.chore_concurrency.max(1);

    // a bounded queue: a worker always has the next job buffered, and the
    // bound throttles how fast discovery can hammer platform APIs
    let (job_tx, job_rx) = mpsc::channel::<Job>(concurrency);
    let job_rx = Arc::new(tokio::sync::Mutex::new(job_rx));

    let mut workers = Vec::with_capacity(concurrency);
    for _ in 0..concurrency {
        let job_rx = Arc::clone(&job_rx);
        let registry = Arc::clone(&registry);
        let executor = Arc::clone(&executor);
        let stats = Arc::clone(&stats);
        workers.push(tokio::spawn(async move {
            loop {
                let job = { job_rx.lock().await.recv().await };
                let Some(job) = job else { break };
                execute_job(&registry, executor.as_ref(), &stats, job).await;
            }
        }));
    }

    tracing::info!("starting to gather chores to do");
    let discovery_result = gather_jobs(&conf, &registry, &stats, &job_tx).await;
    drop(job_tx);
    tracing::info!("finished gathering chores to do");

    for worker in workers {
        worker.await?;
    }

    for platform in registry.platforms() {
        tracing::info!(domain = %platform.config().domain, "de-initialising platform");
        if let Err(e) = platform.deinit().await {
            tracing::error!(error = %e, "error de-initialising platform");
        }
    }

    if let Err(e) = executor.deinit().await {
        tracing::error!(error = %e, "error de-initialising executor");
    }

    discovery_result?;
    Ok(stats.snapshot())
}

/// Discover repos on every platform and enqueue a job per (repo, chore).
async fn gather_jobs(
    conf: &TediumConfig,
    registry: &PlatformRegistry,
    stats: &RunStats,
    job_tx: &mpsc::Sender<Job>,
) -> Result<(), EngineError> {
    for platform_config in &conf.platforms {
        if platform_config.skip_discovery {
            continue;
        }

        let Some(platform) = registry.for_domain(&platform_config.domain) else {
            // registered during init; this shouldn't ever happen
            continue;
        };

        tracing::info!(domain = %platform_config.domain, "discovering repos");
        let repos = platform.discover_repos().await?;
        tracing::info!(count = repos.len(), "finished discovering repos");
        stats.add_repos_discovered(repos.len() as u64);

        for repo in repos {
            if repo.archived {
                tracing::info!(repo = %repo.full_name(), "repo is archived - skipping");
                stats.inc_repos_skipped();
                continue;
            }

            if !platform.accepts_repo(&repo.full_name()) {
                tracing::info!(repo = %repo.full_name(), "repo does not match any filter - skipping");
                stats.inc_repos_skipped();
                continue;
            }

            if !platform.repo_has_tedium_config(&repo).await? {
                // TODO: auto-enrollment
                tracing::info!(repo = %repo.full_name(), "repo has no tedium config - skipping");
                stats.inc_repos_skipped();
                continue;
            }

            let resolved = match resolve_repo_config(registry, &repo).await {
                Ok(Some(resolved)) => resolved,
                Ok(None) => {
                    tracing::info!(repo = %repo.full_name(), "repo has no tedium config - skipping");
                    stats.inc_repos_skipped();
                    continue;
                }
                Err(e) => {
                    tracing::error!(repo = %repo.full_name(), error = %e, "error resolving repo config");
                    stats.inc_repos_failed();
                    continue;
                }
            };

            tracing::info!(
                repo = %repo.full_name(),
                chores = resolved.chores.len(),
                "resolved chores for repo"
            );

            for chore in resolved.chores {
                let final_branch_name = names::final_branch_name(&chore.name);
                let job = Job {
                    config: conf.clone(),
                    repo: repo.clone(),
                    chore,
                    platform_config: platform.config().clone(),
                    work_branch_name: names::work_branch_name(),
                    final_branch_name,
                    execution_steps: Vec::new(),
                };

                stats.inc_jobs_discovered();
                job_tx.send(job).await.map_err(|_| EngineError::QueueClosed)?;
            }
        }
    }

    Ok(())
}

/// Worker body: plan the job, then hand it to the executor.
async fn execute_job(
    registry: &PlatformRegistry,
    executor: &dyn Executor,
    stats: &RunStats,
    mut job: Job,
) {
    let repo_name = job.repo.full_name();
    let chore_name = job.chore.name.clone();

    let Some(platform) = registry.for_domain(&job.platform_config.domain) else {
        tracing::error!(repo = %repo_name, chore = %chore_name, "no platform for job - aborting this chore");
        stats.inc_jobs_failed();
        return;
    };

    if let Err(e) = prepare_job(platform.as_ref(), &mut job) {
        tracing::error!(repo = %repo_name, chore = %chore_name, error = %e, "failed to prepare job - aborting this chore");
        stats.inc_jobs_failed();
        return;
    }

    tracing::info!(repo = %repo_name, chore = %chore_name, "executing chore");
    if let Err(e) = executor.execute_chore(&job).await {
        tracing::error!(repo = %repo_name, chore = %chore_name, error = %e, "error executing chore - aborting this chore");
        stats.inc_jobs_failed();
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
