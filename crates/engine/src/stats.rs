// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run statistics, incremented concurrently by workers.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RunStats {
    repos_discovered: AtomicU64,
    repos_skipped: AtomicU64,
    repos_failed: AtomicU64,
    jobs_discovered: AtomicU64,
    jobs_failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStatsSnapshot {
    pub repos_discovered: u64,
    pub repos_skipped: u64,
    pub repos_failed: u64,
    pub jobs_discovered: u64,
    pub jobs_failed: u64,
}

impl RunStats {
    pub fn add_repos_discovered(&self, count: u64) {
        self.repos_discovered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_repos_skipped(&self) {
        self.repos_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_repos_failed(&self) {
        self.repos_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_jobs_discovered(&self) {
        self.jobs_discovered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_jobs_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RunStatsSnapshot {
        RunStatsSnapshot {
            repos_discovered: self.repos_discovered.load(Ordering::Relaxed),
            repos_skipped: self.repos_skipped.load(Ordering::Relaxed),
            repos_failed: self.repos_failed.load(Ordering::Relaxed),
            jobs_discovered: self.jobs_discovered.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
        }
    }
}
