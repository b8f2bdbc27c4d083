//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod payload;
mod queue;
mod smoke;
mod submit;

pub use payload::PayloadCommands;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

use crate::config::Overrides;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run an evaluation request on a GPU and print its result
    Submit {
        /// GPU class, e.g. H100_BK
        #[arg(long)]
        gpu: String,

        /// Path to the request JSON
        #[arg(long)]
        request: PathBuf,

        /// Run id reported to the build (default: derived from the request)
        #[arg(long)]
        run_id: Option<String>,
    },
    /// Run the inline artifact round-trip test on a queue
    Smoke {
        #[arg(long, default_value = "test")]
        queue: String,

        #[arg(long, default_value = "manual-test")]
        run_id: String,
    },
    /// Show the agents serving a queue
    Queue {
        queue: String,
    },
    /// Encode or decode payload tokens
    Payload {
        #[command(subcommand)]
        command: PayloadCommands,
    },
}

/// Handle a CLI command
///
/// Returns `false` when the command ran but the evaluation it launched failed.
pub async fn handle_command(command: Commands, overrides: &Overrides) -> Result<bool> {
    match command {
        Commands::Submit {
            gpu,
            request,
            run_id,
        } => submit::handle_submit(overrides, &gpu, &request, run_id.as_deref()).await,
        Commands::Smoke { queue, run_id } => smoke::handle_smoke(overrides, &queue, &run_id).await,
        Commands::Queue { queue } => queue::handle_queue(overrides, &queue).await.map(|_| true),
        Commands::Payload { command } => payload::handle_payload_command(command).map(|_| true),
    }
}
