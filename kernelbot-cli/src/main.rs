//! Kernelbot CLI
//!
//! Command-line interface for launching kernel evaluations on remote GPUs
//! through Buildkite.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Overrides;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kernelbot")]
#[command(about = "Launch kernel evaluations on remote GPUs", long_about = None)]
struct Cli {
    /// Buildkite organization slug
    #[arg(long, global = true, env = "BUILDKITE_ORG")]
    org: Option<String>,

    /// Buildkite pipeline slug
    #[arg(long, global = true, env = "BUILDKITE_PIPELINE")]
    pipeline: Option<String>,

    /// Buildkite REST API URL
    #[arg(long, global = true, env = "BUILDKITE_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kernelbot=info,kernelbot_launcher=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let overrides = Overrides {
        org: cli.org,
        pipeline: cli.pipeline,
        api_url: cli.api_url,
    };

    let succeeded = handle_command(cli.command, &overrides).await?;
    if !succeeded {
        std::process::exit(1);
    }

    Ok(())
}
