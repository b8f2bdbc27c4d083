//! Artifact-related API endpoints

use kernelbot_core::dto::artifact::Artifact;
use reqwest::Url;
use reqwest::header::LOCATION;
use tracing::debug;

use crate::BuildkiteClient;
use crate::error::{ClientError, Result};

/// First response of an artifact download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Download {
    /// The API served the content itself
    Content(Vec<u8>),
    /// The API redirected to a pre-signed storage URL
    Redirect(String),
}

impl BuildkiteClient {
    /// List the artifacts of one job
    ///
    /// # Arguments
    /// * `artifacts_url` - The job's `artifacts_url`
    pub async fn list_artifacts(&self, artifacts_url: &str) -> Result<Vec<Artifact>> {
        let response = self
            .client
            .get(artifacts_url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Start downloading an artifact
    ///
    /// The redirect is returned rather than followed; the caller decides how
    /// to fetch the target (see [`BuildkiteClient::fetch_presigned`]).
    pub async fn download_artifact(&self, download_url: &str) -> Result<Download> {
        let response = self
            .client
            .get(download_url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if status.is_redirection() {
            let target = redirect_target(download_url, &response)
                .ok_or_else(|| ClientError::MissingRedirect(download_url.to_string()))?;
            debug!("Artifact download redirected ({})", status);
            return Ok(Download::Redirect(target));
        }

        let response = self.check_status(response).await?;
        Ok(Download::Content(response.bytes().await?.to_vec()))
    }

    /// Fetch a pre-signed storage URL
    ///
    /// Sent without the API token: pre-signed URLs carry their own
    /// credentials and reject requests with a foreign `Authorization` header.
    /// A further redirect is reported as an error, not followed.
    pub async fn fetch_presigned(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let response = self.check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Absolute target of a redirect, resolving a relative `Location`
fn redirect_target(from: &str, response: &reqwest::Response) -> Option<String> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    let base = Url::parse(from).ok()?;
    base.join(location).ok().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::FakeBuildkite;

    #[tokio::test]
    async fn test_list_artifacts() {
        let server = FakeBuildkite::start().await;
        let artifacts = server
            .client()
            .list_artifacts(&server.url("/jobs/j1/artifacts"))
            .await
            .unwrap();

        let names: Vec<&str> = artifacts.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["result.json", "trace.ncu-rep"]);
        assert_eq!(artifacts[1].path, "profile_data/trace.ncu-rep");
    }

    #[tokio::test]
    async fn test_redirect_is_returned_not_followed() {
        let server = FakeBuildkite::start().await;
        let download = server
            .client()
            .download_artifact(&server.url("/download/result"))
            .await
            .unwrap();

        assert_eq!(download, Download::Redirect(server.url("/store/result?sig=abc")));
        assert_eq!(server.store_hits(), 0);
    }

    #[tokio::test]
    async fn test_presigned_fetch_sends_no_auth_header() {
        let server = FakeBuildkite::start().await;
        let body = server
            .client()
            .fetch_presigned(&server.url("/store/result?sig=abc"))
            .await
            .unwrap();

        assert_eq!(body, FakeBuildkite::RESULT_BODY.as_bytes());
        assert_eq!(server.store_hits(), 1);
    }

    #[tokio::test]
    async fn test_direct_download() {
        let server = FakeBuildkite::start().await;
        let download = server
            .client()
            .download_artifact(&server.url("/download/direct"))
            .await
            .unwrap();

        assert_eq!(download, Download::Content(b"direct".to_vec()));
    }

    #[tokio::test]
    async fn test_relative_location_is_resolved() {
        let server = FakeBuildkite::start().await;
        let download = server
            .client()
            .download_artifact(&server.url("/download/relative"))
            .await
            .unwrap();

        assert_eq!(download, Download::Redirect(server.url("/store/missing")));
    }

    #[tokio::test]
    async fn test_failed_downloads() {
        let server = FakeBuildkite::start().await;
        let client = server.client();

        let err = client
            .download_artifact(&server.url("/download/broken"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));

        let err = client
            .fetch_presigned(&server.url("/store/missing"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = client
            .download_artifact(&server.url("/download/no-location"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingRedirect(_)));
    }
}
