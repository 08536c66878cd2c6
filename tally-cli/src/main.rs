mod cli;
mod commands;
mod config;
mod ledger;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::{cli::Cli, config::TallyConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env.tally
    dotenvy::from_filename(".env.tally").ok();

    let cli = Cli::parse();
    let config = TallyConfig::load()?;
    init_tracing(&config.log_level);

    commands::run(cli, config).await
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
