//! # Patterns Operator
//!
//! Controller binary. Starts the probe server, connects to the cluster and
//! reconciles `Pattern` resources in every namespace.

use anyhow::{Context, Result};
use clap::Parser;
use patterns_operator::constants::DEFAULT_METRICS_PORT;
use patterns_operator::runtime::initialization::{initialize, LogFormat};
use patterns_operator::runtime::watch_loop::run_watch_loop;

#[derive(Debug, Parser)]
#[command(name = "patterns-operator", version, about)]
struct Args {
    /// Port for /metrics, /healthz and /readyz
    #[arg(long, env = "METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    metrics_port: u16,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let init = initialize(args.metrics_port, args.log_format)
        .await
        .context("Failed to initialize controller")?;

    run_watch_loop(init.client, init.reconciler, init.server_state)
        .await
        .context("Controller watch loop failed")
}
