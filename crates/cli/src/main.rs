// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `tedium` binary.
//!
//! One binary, three roles: `run` is the outer driver; `init-chore` and
//! `finalise-chore` are the in-sandbox stages that the driver schedules as
//! the first and last containers of every job, reconstructing their job
//! from the `TEDIUM_JOB` envelope.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tedium_core::TediumConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tedium", about = "Applies repeatable chores across a fleet of repos")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Discover repos and run their chores
    Run {
        /// Path to the configuration file (YAML or JSON)
        #[arg(long)]
        config: PathBuf,
    },
    /// Internal: clone and branch inside the execution sandbox
    #[command(name = "init-chore", hide = true)]
    InitChore,
    /// Internal: commit, push and raise a PR inside the execution sandbox
    #[command(name = "finalise-chore", hide = true)]
    FinaliseChore,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run_command(cli.command).await {
        tracing::error!(error = %format!("{e:#}"), "tedium failed");
        std::process::exit(1);
    }
}

async fn run_command(command: Command) -> Result<()> {
    match command {
        Command::Run { config } => {
            let conf = TediumConfig::load(&config)
                .with_context(|| format!("loading configuration from {}", config.display()))?;
            tedium_engine::run(conf).await.context("running sweep")?;
        }
        Command::InitChore => {
            tedium_engine::init_chore::init_chore().await.context("initialising chore")?;
        }
        Command::FinaliseChore => {
            tedium_engine::finalise_chore::finalise_chore().await.context("finalising chore")?;
        }
    }
    Ok(())
}
