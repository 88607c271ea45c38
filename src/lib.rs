//! clashcheck -- contract test harness for the Clash Intelligence dashboard API.
//!
//! This crate drives a fixed sequence of validation scenarios against a
//! running dashboard, records one outcome per check, and summarizes the run
//! into a persisted report and an exit code.

pub mod config;
pub mod context;
pub mod orchestrator;
pub mod outcome;
pub mod report;
pub mod scenario;
pub mod schema;
pub mod transport;

use anyhow::Result;

use config::HarnessConfig;
use context::RunContext;
use orchestrator::Orchestrator;
use report::RunReport;
use transport::ApiClient;

/// Run the selected scenarios (all of them when `only` is empty) and build
/// the report. Persisting it is left to the caller.
pub async fn run(config: &HarnessConfig, only: &[String]) -> Result<RunReport> {
    let scenarios = scenario::select(only)?;
    let api = ApiClient::new(&config.target)?;

    println!("🚀 Starting Clash Intelligence Dashboard API Tests");
    println!("Base URL: {}", api.base_url());
    println!("Test Clan Tag: {}", config.target.clan_tag);
    println!("{}", "=".repeat(60));

    let ctx = RunContext::new(api.base_url(), config.target.clan_tag.clone());
    let (outcomes, ctx) = Orchestrator::new(api, scenarios).run(ctx).await;
    tracing::debug!(player_tag = ?ctx.discovered_player_tag, "run context discarded");

    Ok(RunReport::from_outcomes(outcomes))
}
