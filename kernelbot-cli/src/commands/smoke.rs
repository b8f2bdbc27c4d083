//! Smoke command handler

use anyhow::Result;
use colored::*;
use kernelbot_launcher::BuildkiteLauncher;
use tracing::info;

use crate::config::Overrides;
use crate::output::{ConsoleReporter, print_result};

/// Run the smoke-test pipeline on a queue
pub async fn handle_smoke(overrides: &Overrides, queue: &str, run_id: &str) -> Result<bool> {
    let mut launcher = BuildkiteLauncher::new(overrides.load()?)?;

    println!("{} {} on queue {}", "Smoke test".bold(), run_id, queue);

    let result = launcher.smoke_test(queue, run_id, &ConsoleReporter).await?;
    launcher.shutdown();
    info!(queue, run_id, success = result.success, "Smoke test finished");

    print_result(&result);
    Ok(result.success)
}
