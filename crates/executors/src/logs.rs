// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serialised container log printing.
//!
//! Workers run concurrently, but each container's log block must reach
//! stdout contiguously. One [`LogPrinter`] is created per run and handed to
//! every executor; holding its lock for the duration of a block keeps
//! START/END frames from interleaving.

use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct LogPrinter {
    lock: Arc<Mutex<()>>,
}

impl LogPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print one container's collected output, framed by START/END markers.
    pub fn print_block(&self, container: &str, content: &str) {
        let _guard = self.lock.lock();

        tracing::info!(%container, "START of logs for container");
        for line in content.lines() {
            let line = line.trim_end();
            if !line.is_empty() {
                println!("{line}");
            }
        }
        tracing::info!(%container, "END of logs for container");
    }
}
