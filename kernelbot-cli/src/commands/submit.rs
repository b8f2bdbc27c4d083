//! Submit command handler

use anyhow::{Context, Result};
use colored::*;
use kernelbot_core::EvaluationRequest;
use kernelbot_launcher::{BuildkiteLauncher, Launcher};
use std::path::Path;
use tracing::info;

use crate::config::Overrides;
use crate::output::{ConsoleReporter, print_result};

/// Run a request file and print the result
pub async fn handle_submit(
    overrides: &Overrides,
    gpu: &str,
    request_path: &Path,
    run_id: Option<&str>,
) -> Result<bool> {
    let content = std::fs::read_to_string(request_path)
        .with_context(|| format!("Failed to read {}", request_path.display()))?;
    let request: EvaluationRequest =
        serde_json::from_str(&content).context("Failed to parse request JSON")?;

    let mut launcher = BuildkiteLauncher::new(overrides.load()?)?;

    println!(
        "{} {} ({} mode) on {}",
        "Launching".bold(),
        request.main,
        request.mode.as_str(),
        gpu
    );

    let result = match run_id {
        Some(run_id) => launcher.launch_as(&request, gpu, run_id, &ConsoleReporter).await?,
        None => launcher.launch(&request, gpu, &ConsoleReporter).await?,
    };
    launcher.shutdown();
    info!(gpu, success = result.success, "Launch finished");

    print_result(&result);
    Ok(result.success)
}
