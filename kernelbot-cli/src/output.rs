//! Console output
//!
//! Progress reporting and result printing for the terminal.

use async_trait::async_trait;
use colored::*;
use kernelbot_core::dto::agent::QueueStatus;
use kernelbot_core::{EvalResult, FullResult};
use kernelbot_launcher::ProgressReporter;

/// Prints launch progress to stdout
pub struct ConsoleReporter;

#[async_trait]
impl ProgressReporter for ConsoleReporter {
    async fn push(&self, message: &str) {
        println!("{} {}", "[STATUS]".cyan().bold(), message);
    }

    async fn update(&self, message: &str) {
        println!("{} {}", "[UPDATE]".dimmed(), message);
    }
}

/// Print a launch result
pub fn print_result(result: &FullResult) {
    println!();
    if result.success {
        println!("{}", "✓ Evaluation succeeded".green().bold());
    } else {
        let reason = result.error.as_deref().unwrap_or("unknown error");
        println!("{} {}", "✗ Evaluation failed:".red().bold(), reason);
    }

    if !result.system.gpu.is_empty() {
        println!(
            "  {}: {} x{}",
            "GPU".bold(),
            result.system.gpu,
            result.system.device_count
        );
    }
    if !result.system.hostname.is_empty() {
        println!("  {}: {}", "Host".bold(), result.system.hostname);
    }

    let mut names: Vec<&String> = result.runs.keys().collect();
    names.sort();
    for name in names {
        print_run(name, &result.runs[name]);
    }
}

fn print_run(name: &str, run: &EvalResult) {
    let elapsed = (run.end - run.start).num_milliseconds() as f64 / 1000.0;
    let status = if run.passed() {
        "passed".green()
    } else {
        "not passed".yellow()
    };

    println!();
    println!("  {} {} ({:.1}s)", name.bold(), status, elapsed);

    if let Some(compilation) = &run.compilation {
        let outcome = if compilation.success { "ok".green() } else { "failed".red() };
        println!("    {}: {}", "Compile".dimmed(), outcome);
        if !compilation.success && !compilation.stderr.is_empty() {
            println!("{}", indent(&compilation.stderr));
        }
    }

    if let Some(execution) = &run.run {
        println!(
            "    {}: exit {} in {:.3}s",
            "Run".dimmed(),
            execution.exit_code,
            execution.duration
        );
        for (key, value) in &execution.result {
            println!("      {} = {}", key, value);
        }
        if !execution.passed && !execution.stderr.is_empty() {
            println!("{}", indent(&execution.stderr));
        }
    }

    if let Some(profile) = &run.profile {
        println!("    {}: {}", "Profiler".dimmed(), profile.profiler);
        if let Some(url) = &profile.download_url {
            println!("    {}: {}", "Trace".dimmed(), url);
        }
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("      {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print the agents serving a queue
pub fn print_queue_status(status: &QueueStatus) {
    println!(
        "{}",
        format!(
            "Queue {}: {} agent(s), {} idle",
            status.queue, status.total, status.idle
        )
        .bold()
    );

    if status.agents.is_empty() {
        println!("{}", "No agents found.".yellow());
        return;
    }

    println!();
    for agent in &status.agents {
        let busy = if agent.busy { "busy".yellow() } else { "idle".green() };
        let gpu = agent
            .gpu_index
            .as_deref()
            .map(|index| format!("gpu {}", index))
            .unwrap_or_default();
        println!("  {:<24} {:<12} {:<6} {}", agent.name, agent.state, busy, gpu.dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_prefixes_every_line() {
        assert_eq!(indent("a\nb"), "      a\n      b");
    }
}
