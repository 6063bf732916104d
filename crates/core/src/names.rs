// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Branch and resource naming.

use rand::distributions::Alphanumeric;
use rand::Rng;

const NONCE_LENGTH: usize = 8;

/// An 8-character lowercase alphanumeric nonce.
fn nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}

/// A collision-resistant name for a throwaway resource: `tedium-<role>-<nonce>`.
pub fn unique_name(role: &str) -> String {
    format!("tedium-{}-{}", role, nonce())
}

/// The unique work branch for one job.
pub fn work_branch_name() -> String {
    unique_name("work")
}

/// The deterministic final branch for a chore: `tedium/<slug>`.
///
/// The slug lowercases the chore name, turns spaces into hyphens, and strips
/// everything outside `[a-z0-9-]`, so re-running the same chore always
/// targets the same branch.
pub fn final_branch_name(chore_name: &str) -> String {
    let slug: String = chore_name
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    format!("tedium/{}", slug)
}

#[cfg(test)]
#[path = "names_tests.rs"]
mod tests;
