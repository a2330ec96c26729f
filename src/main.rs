//! offer-relay: one discovery/delivery run, meant to be triggered by cron.
//!
//! Exits non-zero only when configuration is missing or invalid; every fetch
//! or delivery problem is logged (and alerted, when total) instead.

use anyhow::Context;
use offer_relay::{telemetry, RelayConfig, RunCoordinator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env locally; no-op in CI where secrets come from the environment.
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let config = RelayConfig::from_env().context("loading configuration")?;
    tracing::info!(
        keywords = config.keywords.len(),
        ledger = %config.ledger_path.display(),
        "starting run"
    );

    let mut coordinator = RunCoordinator::from_config(&config).context("building pipeline")?;
    let report = coordinator.run().await;
    tracing::debug!(?report, "run report");
    Ok(())
}
