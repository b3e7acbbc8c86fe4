use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dagd::adapter::inbound::cli::Cli;
use dagd::application::shutdown::DrainOutcome;
use dagd::infrastructure::config::{logging, Settings};
use dagd::infrastructure::orchestration;
use tracing::{info, warn};

/// Exit status when the drain timed out with tasks still running.
const FORCED_EXIT: i32 = 2;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let code = match run().await {
        Ok(DrainOutcome::Graceful) => 0,
        Ok(DrainOutcome::Forced { .. }) => FORCED_EXIT,
        Err(e) => {
            eprintln!("dagd: {e:#}");
            1
        }
    };
    // The console thread may still be blocked reading the terminal.
    let _ = std::io::stdout().flush();
    std::process::exit(code);
}

async fn run() -> anyhow::Result<DrainOutcome> {
    let cli = Cli::parse();
    let settings = Settings::from_cli(cli).context("invalid startup flags")?;
    let log = logging::init(settings.log_level, settings.log_format)
        .context("failed to initialise logging")?;
    info!(version = env!("CARGO_PKG_VERSION"), "dagd starting");

    let outcome = orchestration::run(settings, Arc::new(log))
        .await
        .context("startup failed")?;
    match outcome {
        DrainOutcome::Graceful => info!("dagd stopped"),
        DrainOutcome::Forced { remaining } => warn!(remaining, "dagd stopped with tasks still running"),
    }
    Ok(outcome)
}
