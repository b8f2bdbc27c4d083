//! Error taxonomy of a launch

use kernelbot_client::ClientError;
use kernelbot_core::codec::CodecError;
use kernelbot_core::parser::ResultParseError;
use kernelbot_core::{BuildState, GpuError};
use std::time::Duration;
use thiserror::Error;

/// Failure of one stage of a launch
///
/// The launcher absorbs all of these into a failed `FullResult`; the
/// `Display` text becomes the result's `error` string.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The request could not be turned into a payload token; nothing was sent
    #[error("Failed to encode request: {0}")]
    Encoding(#[from] CodecError),

    /// The build system rejected the submission. Not retried.
    #[error("Failed to create build: {0}")]
    Dispatch(#[source] ClientError),

    /// A single poll failed; retried until the deadline
    #[error("Error polling build: {0}")]
    PollTransient(#[source] ClientError),

    /// The deadline passed while the build was still in flight
    #[error("Build timed out after {}s; remote state unknown, {}", .waited.as_secs(), cancel_note(.cancel_requested))]
    Timeout {
        waited: Duration,
        cancel_requested: bool,
    },

    /// The build finished without passing
    #[error("Build {0}")]
    Terminal(BuildState),

    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Failed to download {artifact}: {source}")]
    ArtifactDownload {
        artifact: String,
        #[source]
        source: ClientError,
    },

    #[error("Failed to parse result: {0}")]
    ResultParse(#[from] ResultParseError),
}

fn cancel_note(cancel_requested: &bool) -> &'static str {
    if *cancel_requested {
        "cancellation requested"
    } else {
        "cancellation could not be requested"
    }
}

/// Errors raised before anything is submitted
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    MissingVar(&'static str),

    #[error("Invalid value '{value}' for {name}")]
    InvalidVar { name: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error("Failed to initialize build system client: {0}")]
    Client(#[from] ClientError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_message_names_state() {
        assert_eq!(LaunchError::Terminal(BuildState::Blocked).to_string(), "Build blocked");
        assert_eq!(LaunchError::Terminal(BuildState::Canceled).to_string(), "Build canceled");
    }

    #[test]
    fn test_timeout_message() {
        let err = LaunchError::Timeout {
            waited: Duration::from_secs(900),
            cancel_requested: true,
        };
        assert_eq!(
            err.to_string(),
            "Build timed out after 900s; remote state unknown, cancellation requested"
        );
    }
}
