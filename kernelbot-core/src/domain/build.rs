//! Remote build domain types

use serde::{Deserialize, Serialize};

/// Lifecycle state of a remote build
///
/// Backend-specific status strings are mapped to this enum at the HTTP
/// boundary; nothing past the client compares raw strings.
///
/// `Passed`, `Failed`, `Canceled`, `Blocked` and `TimedOut` are terminal and
/// absorbing. `TimedOut` is never reported by a backend: it is produced locally
/// when the wait deadline expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    Scheduled,
    Running,
    Passed,
    Failed,
    Canceled,
    Blocked,
    TimedOut,
}

impl BuildState {
    /// Maps a Buildkite build state string
    ///
    /// Returns `None` for strings this version does not know.
    pub fn from_wire(state: &str) -> Option<Self> {
        match state {
            "creating" | "scheduled" | "waiting" => Some(Self::Scheduled),
            // failing and canceling still have jobs in flight
            "running" | "failing" | "canceling" => Some(Self::Running),
            "passed" => Some(Self::Passed),
            "failed" => Some(Self::Failed),
            "canceled" | "skipped" | "not_run" => Some(Self::Canceled),
            "blocked" => Some(Self::Blocked),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Scheduled | Self::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Blocked => "blocked",
            Self::TimedOut => "timed out",
        }
    }
}

impl std::fmt::Display for BuildState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a build issued by the backend
///
/// Created once per launch. `state` is the state reported at creation time;
/// later states are observed by polling and carried in [`BuildSnapshot`],
/// never written back here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBuild {
    /// Backend identifier (UUID on Buildkite)
    pub id: String,

    /// Human-facing sequence number
    pub number: u64,

    /// API URL of the build, used for polling and cancellation
    pub url: String,

    /// Browser URL of the build
    pub web_url: String,

    pub state: BuildState,
}

/// One poll observation of a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSnapshot {
    pub state: BuildState,

    /// Where to list artifacts from, one entry per job that has any
    pub artifact_sources: Vec<String>,
}
