//! target-health
//!
//! Periodically probes a set of targets and classifies each as healthy or
//! unhealthy with consecutive-result hysteresis.
//!
//! # Architecture Overview
//!
//! ```text
//!     config file ──▶ ConfigWatcher ──▶ SharedTargetSource
//!                                              │ refresh
//!                                              ▼
//!     ┌────────────────────────── HealthMonitor (one task) ──────────────────────────┐
//!     │  tick ─▶ reconcile targets ─▶ probe all (JoinSet) ─▶ classify ─▶ publish?    │
//!     └──────────────────────────────────────────────────────────────┬───────────────┘
//!                                                                    │ Arc<Snapshot>
//!                            ┌───────────────────────┬───────────────┴──────┐
//!                            ▼                       ▼                      ▼
//!                      admin endpoint          change listeners        embedders
//! ```

use std::path::PathBuf;

use clap::Parser;

use target_health::config::load_config;
use target_health::lifecycle::startup;
use target_health::observability::logging;

#[derive(Parser)]
#[command(name = "target-health")]
#[command(about = "Probe targets and classify their health with hysteresis", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "target-health.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    logging::init(&config.observability)?;

    tracing::info!(
        path = %cli.config.display(),
        interval_ms = config.health_check.interval_ms,
        timeout_ms = config.health_check.timeout_ms,
        "Configuration loaded"
    );

    startup::run(config, Some(cli.config)).await?;
    Ok(())
}
