//! Launcher configuration
//!
//! Defines the Buildkite connection settings, the job resources requested for
//! each build, and the polling intervals and deadlines of a launch.

use kernelbot_core::codec::DEFAULT_MAX_TOKEN_BYTES;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://api.buildkite.com/v2";

/// Buildkite launcher configuration
///
/// All timeouts and intervals are configurable to allow tuning
/// for different deployment scenarios (test queue vs production GPUs).
#[derive(Debug, Clone)]
pub struct BuildkiteConfig {
    /// REST API base URL
    pub api_url: String,

    pub org_slug: String,

    pub pipeline_slug: String,

    /// API access token
    pub api_token: String,

    /// Container image the evaluation job runs in
    pub image: String,

    /// Branch and commit the build is created against
    pub branch: String,
    pub commit: String,

    /// How often to poll a build's state
    pub poll_interval: Duration,

    /// Maximum time from submission until a build must finish
    pub max_wait: Duration,

    /// Timeout of a single HTTP request
    pub request_timeout: Duration,

    /// Resources requested for the job
    pub cpus: u32,
    pub memory: String,

    /// Hard ceiling on the encoded payload carried in the build environment
    pub max_payload_bytes: usize,
}

impl BuildkiteConfig {
    /// Creates a new configuration with defaults
    pub fn new(
        org_slug: impl Into<String>,
        pipeline_slug: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            org_slug: org_slug.into(),
            pipeline_slug: pipeline_slug.into(),
            api_token: api_token.into(),
            image: "ghcr.io/gpu-mode/kernelbot:latest".to_string(),
            branch: "main".to_string(),
            commit: "HEAD".to_string(),
            poll_interval: Duration::from_secs(10),
            max_wait: Duration::from_secs(900), // 15 minutes
            request_timeout: Duration::from_secs(30),
            cpus: 8,
            memory: "64g".to_string(),
            max_payload_bytes: DEFAULT_MAX_TOKEN_BYTES,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - BUILDKITE_API_TOKEN (required)
    /// - BUILDKITE_ORG (optional, default: gpu-mode)
    /// - BUILDKITE_PIPELINE (optional, default: kernelbot)
    /// - BUILDKITE_API_URL (optional)
    /// - BUILDKITE_BRANCH / BUILDKITE_COMMIT (optional, default: main / HEAD)
    /// - KERNELBOT_IMAGE (optional)
    /// - KERNELBOT_POLL_INTERVAL (optional, seconds, default: 10)
    /// - KERNELBOT_MAX_WAIT (optional, seconds, default: 900)
    /// - KERNELBOT_REQUEST_TIMEOUT (optional, seconds, default: 30)
    /// - KERNELBOT_CPUS / KERNELBOT_MEMORY (optional, default: 8 / 64g)
    /// - KERNELBOT_MAX_PAYLOAD_BYTES (optional, default: 131072)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`BuildkiteConfig::from_env`], reading variables through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_token =
            lookup("BUILDKITE_API_TOKEN").ok_or(ConfigError::MissingVar("BUILDKITE_API_TOKEN"))?;

        let org = lookup("BUILDKITE_ORG").unwrap_or_else(|| "gpu-mode".to_string());
        let pipeline = lookup("BUILDKITE_PIPELINE").unwrap_or_else(|| "kernelbot".to_string());

        let mut config = Self::new(org, pipeline, api_token);

        if let Some(api_url) = lookup("BUILDKITE_API_URL") {
            config.api_url = api_url;
        }
        if let Some(branch) = lookup("BUILDKITE_BRANCH") {
            config.branch = branch;
        }
        if let Some(commit) = lookup("BUILDKITE_COMMIT") {
            config.commit = commit;
        }
        if let Some(image) = lookup("KERNELBOT_IMAGE") {
            config.image = image;
        }
        if let Some(memory) = lookup("KERNELBOT_MEMORY") {
            config.memory = memory;
        }
        if let Some(secs) = parse_var(&lookup, "KERNELBOT_POLL_INTERVAL")? {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var(&lookup, "KERNELBOT_MAX_WAIT")? {
            config.max_wait = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var(&lookup, "KERNELBOT_REQUEST_TIMEOUT")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(cpus) = parse_var(&lookup, "KERNELBOT_CPUS")? {
            config.cpus = cpus;
        }
        if let Some(bytes) = parse_var(&lookup, "KERNELBOT_MAX_PAYLOAD_BYTES")? {
            config.max_payload_bytes = bytes;
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.api_token.is_empty() {
            return invalid("api_token cannot be empty");
        }

        if self.org_slug.is_empty() || self.pipeline_slug.is_empty() {
            return invalid("org_slug and pipeline_slug cannot be empty");
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return invalid("api_url must start with http:// or https://");
        }

        if self.poll_interval.is_zero() {
            return invalid("poll_interval must be greater than 0");
        }

        if self.max_wait < self.poll_interval {
            return invalid("max_wait must be at least one poll_interval");
        }

        if self.max_payload_bytes == 0 {
            return invalid("max_payload_bytes must be greater than 0");
        }

        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { name, value }),
    }
}
