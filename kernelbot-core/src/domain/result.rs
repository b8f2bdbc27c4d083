//! Evaluation result domain types
//!
//! Mirrors the `result.json` artifact written by the remote runner. Sub-results
//! that were not performed are `None`, never a zero-valued placeholder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Outcome of compiling the submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileResult {
    pub nvcc_found: bool,
    pub nvcc_version: String,
    pub success: bool,
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Outcome of executing the submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunResult {
    /// The process ran to completion
    pub success: bool,
    /// The checks passed
    pub passed: bool,
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    /// Wall time in seconds
    pub duration: f64,
    /// Key/value report emitted by the evaluation harness
    pub result: BTreeMap<String, String>,
}

/// Outcome of profiling the submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileResult {
    pub profiler: String,
    pub trace: String,
    /// Where the raw profiler output can be downloaded on demand
    pub download_url: Option<String>,
}

/// One named run ("test", "benchmark", "leaderboard", ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub compilation: Option<CompileResult>,
    pub run: Option<RunResult>,
    pub profile: Option<ProfileResult>,
}

impl EvalResult {
    /// True when the run was executed and its checks passed
    pub fn passed(&self) -> bool {
        self.run.as_ref().is_some_and(|run| run.passed)
    }
}

/// Description of the machine that executed the runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemInfo {
    pub gpu: String,
    pub device_count: u32,
    pub cpu: String,
    pub runtime: String,
    pub platform: String,
    pub torch: String,
    pub hostname: String,
}

/// Terminal value of a launch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullResult {
    pub success: bool,
    pub error: Option<String>,
    pub runs: HashMap<String, EvalResult>,
    pub system: SystemInfo,
}

impl FullResult {
    /// A failed launch with a human-readable reason and no runs
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            runs: HashMap::new(),
            system: SystemInfo::default(),
        }
    }
}
