//! Queue command handler

use anyhow::{Context, Result};
use kernelbot_launcher::BuildkiteLauncher;

use crate::config::Overrides;
use crate::output::print_queue_status;

/// Show the agents of a queue
pub async fn handle_queue(overrides: &Overrides, queue: &str) -> Result<()> {
    let launcher = BuildkiteLauncher::new(overrides.load()?)?;

    let status = launcher
        .queue_status(queue)
        .await
        .context("Failed to fetch agents")?;

    print_queue_status(&status);
    Ok(())
}
