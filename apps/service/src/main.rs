mod config;
mod error;
mod monitoring;
mod notify;
mod orchestrator;
mod registry;
mod sink;
mod validation;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;

use crate::config::Config;
use crate::orchestrator::Orchestrator;

#[derive(Parser)]
#[command(name = "vakt-service", about = "Uptime monitoring service", version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run with a no-op metrics sink
    #[arg(long)]
    dev: bool,

    /// Run a single on-demand check and exit
    #[arg(long)]
    check: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    show_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    logger::init_tracing();

    let cli = Cli::parse();

    let mut config = Config::from_config(cli.config.as_ref())
        .map_err(|error| anyhow!("failed to load configuration: {error:?}"))?;
    config.apply_env();
    if cli.dev {
        config.monitor.dev_mode = true;
    }

    if cli.show_config {
        println!("{config}");
        return Ok(());
    }

    let orchestrator = Orchestrator::new(config)?;

    if cli.check {
        orchestrator.run_check_now().await;
        return Ok(());
    }

    orchestrator.run().await
}
