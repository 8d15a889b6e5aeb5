//! # Mentor Node
//!
//! Runs a generated plan through link verification and the program lifecycle.

use anyhow::Context;
use clap::Parser;
use mentor_core::PlanDocument;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod state;
mod triggers;
mod workflow;

use config::{Cli, RunnerConfig};
use state::AppState;

/// Run the workflow described by `config`.
async fn run(config: RunnerConfig) -> anyhow::Result<()> {
    info!("🚀 Mentor node starting...");

    let state = AppState::from_config(&config)?;

    let plan = match config.plan_path.as_deref() {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read plan file {}", path.display()))?;
            PlanDocument::from_json(&raw)?
        }
        None => PlanDocument::from_json(workflow::SAMPLE_PLAN)?,
    };

    let outcome =
        workflow::run_workflow(&state, plan, &config.user_id, config.require_verified).await?;

    println!("{}", workflow::render_report(&outcome));

    if outcome.halted() {
        anyhow::bail!(
            "{} of {} links failed verification; program left in {}",
            outcome.summary.failed,
            outcome.summary.total,
            outcome.program.state
        );
    }

    info!("✅ Program {} is {}", outcome.program.id, outcome.program.state);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = RunnerConfig::from_cli(Cli::parse())?;
    run(config).await
}
