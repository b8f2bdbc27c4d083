//! Artifact retrieval
//!
//! Locates `result.json` among a finished build's artifacts and downloads it.
//! Downloads are two-legged: the build system usually answers with a redirect
//! to object storage, and the storage URL is fetched without the build
//! system's credentials.

use kernelbot_client::Download;
use kernelbot_core::BuildSnapshot;
use kernelbot_core::dto::artifact::Artifact;
use kernelbot_core::parser::RESULT_ARTIFACT;
use tracing::{debug, info};

use crate::backend::BuildBackend;
use crate::error::LaunchError;

/// Path prefix of profiler output uploaded by the job
pub const PROFILE_PREFIX: &str = "profile_data/";

/// Raw result artifact and the location of any profiling data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedArtifacts {
    pub result: Vec<u8>,
    /// Download URL of the first profiling artifact. Not fetched.
    pub profile_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactRetriever;

impl ArtifactRetriever {
    pub fn new() -> Self {
        Self
    }

    /// Downloads the result artifact of a passed build
    pub async fn fetch<B: BuildBackend + ?Sized>(
        &self,
        backend: &B,
        snapshot: &BuildSnapshot,
    ) -> Result<RetrievedArtifacts, LaunchError> {
        if snapshot.artifact_sources.is_empty() {
            return Err(LaunchError::ArtifactNotFound(RESULT_ARTIFACT.to_string()));
        }

        let artifacts = backend
            .list_artifacts(snapshot)
            .await
            .map_err(|source| LaunchError::ArtifactDownload {
                artifact: RESULT_ARTIFACT.to_string(),
                source,
            })?;
        debug!("Build has {} artifact(s)", artifacts.len());

        let result = artifacts
            .iter()
            .find(|a| is_result(a))
            .ok_or_else(|| LaunchError::ArtifactNotFound(RESULT_ARTIFACT.to_string()))?;

        let profile_url = artifacts
            .iter()
            .find(|a| a.path.starts_with(PROFILE_PREFIX))
            .map(|a| a.download_url.clone());

        let content = self.download(backend, result).await?;
        info!("Downloaded {} ({} bytes)", result.filename, content.len());

        Ok(RetrievedArtifacts {
            result: content,
            profile_url,
        })
    }

    async fn download<B: BuildBackend + ?Sized>(
        &self,
        backend: &B,
        artifact: &Artifact,
    ) -> Result<Vec<u8>, LaunchError> {
        let wrap = |source| LaunchError::ArtifactDownload {
            artifact: artifact.filename.clone(),
            source,
        };

        match backend.download(artifact).await.map_err(wrap)? {
            Download::Content(bytes) => Ok(bytes),
            Download::Redirect(url) => {
                debug!("Following artifact redirect to object storage");
                backend.fetch_presigned(&url).await.map_err(wrap)
            }
        }
    }
}

fn is_result(artifact: &Artifact) -> bool {
    artifact.filename == RESULT_ARTIFACT || artifact.path == RESULT_ARTIFACT
}
