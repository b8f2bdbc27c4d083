//! Buildkite backend

use async_trait::async_trait;
use kernelbot_client::{BuildkiteClient, Download, Result};
use kernelbot_core::dto::artifact::Artifact;
use kernelbot_core::dto::build::CreateBuild;
use kernelbot_core::{BuildSnapshot, BuildState, RemoteBuild};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::{BuildBackend, BuildSubmission, Submitted};
use crate::config::BuildkiteConfig;

/// Per-job settings exported into the build environment
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub image: String,
    pub cpus: u32,
    pub memory: String,
    pub branch: String,
    pub commit: String,
}

impl From<&BuildkiteConfig> for JobSettings {
    fn from(config: &BuildkiteConfig) -> Self {
        Self {
            image: config.image.clone(),
            cpus: config.cpus,
            memory: config.memory.clone(),
            branch: config.branch.clone(),
            commit: config.commit.clone(),
        }
    }
}

/// [`BuildBackend`] over the Buildkite REST API
#[derive(Debug, Clone)]
pub struct BuildkiteBackend {
    client: BuildkiteClient,
    settings: JobSettings,
}

impl BuildkiteBackend {
    pub fn new(client: BuildkiteClient, settings: JobSettings) -> Self {
        Self { client, settings }
    }

    /// Builds the HTTP client described by `config`
    pub fn connect(config: &BuildkiteConfig) -> Result<Self> {
        let client = BuildkiteClient::new(
            &config.api_url,
            &config.org_slug,
            &config.pipeline_slug,
            &config.api_token,
            config.request_timeout,
        )?;
        Ok(Self::new(client, JobSettings::from(config)))
    }

    pub fn client(&self) -> &BuildkiteClient {
        &self.client
    }

    /// Request body for a submission
    pub fn build_request(&self, submission: &BuildSubmission) -> CreateBuild {
        let mut env = BTreeMap::new();
        env.insert("KERNELBOT_RUN_ID".to_string(), submission.run_id.clone());
        env.insert("KERNELBOT_PAYLOAD".to_string(), submission.payload.clone());
        env.insert("KERNELBOT_QUEUE".to_string(), submission.gpu.queue.clone());
        env.insert("KERNELBOT_IMAGE".to_string(), self.settings.image.clone());
        env.insert("KERNELBOT_CPUS".to_string(), self.settings.cpus.to_string());
        env.insert("KERNELBOT_MEMORY".to_string(), self.settings.memory.clone());

        let mut meta_data = BTreeMap::new();
        meta_data.insert("run_id".to_string(), submission.run_id.clone());
        meta_data.insert("queue".to_string(), submission.gpu.queue.clone());

        CreateBuild {
            commit: self.settings.commit.clone(),
            branch: self.settings.branch.clone(),
            message: format!("Kernel eval: {}", submission.run_id),
            env,
            meta_data,
            steps: submission.steps.clone(),
        }
    }
}

/// Maps a wire state, falling back for strings this version does not know
fn map_state(raw: &str, fallback: BuildState) -> BuildState {
    BuildState::from_wire(raw).unwrap_or_else(|| {
        warn!("Unknown Buildkite build state '{}', treating as {}", raw, fallback);
        fallback
    })
}

#[async_trait]
impl BuildBackend for BuildkiteBackend {
    fn name(&self) -> &str {
        "Buildkite"
    }

    async fn submit(&self, submission: &BuildSubmission) -> Result<Submitted> {
        let build = self.client.create_build(&self.build_request(submission)).await?;
        let state = map_state(&build.state, BuildState::Scheduled);
        let snapshot = build.snapshot(state);

        Ok(Submitted {
            build: build.into_remote(state),
            snapshot,
        })
    }

    async fn poll(&self, build: &RemoteBuild) -> Result<BuildSnapshot> {
        let current = self.client.get_build(&build.url).await?;
        Ok(current.snapshot(map_state(&current.state, BuildState::Running)))
    }

    async fn list_artifacts(&self, snapshot: &BuildSnapshot) -> Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();
        for source in &snapshot.artifact_sources {
            let listed = self.client.list_artifacts(source).await?;
            debug!("{} artifact(s) at {}", listed.len(), source);
            artifacts.extend(listed);
        }
        Ok(artifacts)
    }

    async fn download(&self, artifact: &Artifact) -> Result<Download> {
        self.client.download_artifact(&artifact.download_url).await
    }

    async fn fetch_presigned(&self, url: &str) -> Result<Vec<u8>> {
        self.client.fetch_presigned(url).await
    }

    async fn cancel(&self, build: &RemoteBuild) -> Result<()> {
        self.client.cancel_build(&build.url).await
    }
}
