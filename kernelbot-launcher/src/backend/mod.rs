//! Build system backends
//!
//! A backend is the minimal client a launch needs from a build system. The
//! poll loop, the artifact retriever and the launch flow are written once
//! against [`BuildBackend`]; each build system only supplies the calls below.

mod buildkite;

pub use buildkite::{BuildkiteBackend, JobSettings};

use async_trait::async_trait;
use kernelbot_client::{Download, Result};
use kernelbot_core::dto::artifact::Artifact;
use kernelbot_core::{BuildSnapshot, GpuDescriptor, RemoteBuild};

/// Everything needed to create one build
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSubmission {
    pub run_id: String,
    pub gpu: GpuDescriptor,
    /// Encoded request token
    pub payload: String,
    /// Inline steps replacing the pipeline definition, if any
    pub steps: Option<Vec<serde_json::Value>>,
}

/// A freshly created build and the state the backend reported with it
#[derive(Debug, Clone)]
pub struct Submitted {
    pub build: RemoteBuild,
    pub snapshot: BuildSnapshot,
}

#[async_trait]
pub trait BuildBackend: Send + Sync {
    /// Display name of the build system
    fn name(&self) -> &str;

    /// Creates a build. Called once per launch.
    async fn submit(&self, submission: &BuildSubmission) -> Result<Submitted>;

    /// Observes the current state of a build
    async fn poll(&self, build: &RemoteBuild) -> Result<BuildSnapshot>;

    /// Lists the artifacts of every job in the snapshot
    async fn list_artifacts(&self, snapshot: &BuildSnapshot) -> Result<Vec<Artifact>>;

    /// First leg of an artifact download, redirects not followed
    async fn download(&self, artifact: &Artifact) -> Result<Download>;

    /// Fetches a pre-signed URL without backend credentials
    async fn fetch_presigned(&self, url: &str) -> Result<Vec<u8>>;

    /// Requests cancellation of a build
    async fn cancel(&self, build: &RemoteBuild) -> Result<()>;
}
