//! Kernelbot build system client
//!
//! A typed HTTP client for the Buildkite REST API (v2), covering exactly what
//! a launch needs: creating and polling builds, listing and downloading
//! artifacts, cancelling builds and listing agents.
//!
//! The underlying [`reqwest::Client`] never follows redirects on its own.
//! Artifact downloads answer with a redirect to object storage, and the
//! pre-signed target must be fetched without the API token; see
//! [`BuildkiteClient::download_artifact`] and [`BuildkiteClient::fetch_presigned`].
//!
//! # Example
//!
//! ```no_run
//! use kernelbot_client::BuildkiteClient;
//! use std::time::Duration;
//!
//! # async fn example() -> kernelbot_client::Result<()> {
//! let client = BuildkiteClient::new(
//!     "https://api.buildkite.com/v2",
//!     "gpu-mode",
//!     "kernelbot",
//!     "bkua_xxx",
//!     Duration::from_secs(30),
//! )?;
//! let agents = client.list_agents().await?;
//! println!("{} agents online", agents.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
mod agents;
mod artifacts;
mod builds;

#[cfg(any(test, feature = "test-util"))]
pub mod test_server;

pub use artifacts::Download;
pub use error::{ClientError, Result};

use reqwest::Client;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for one Buildkite pipeline
///
/// Cheap to clone; clones share the connection pool and are safe to use from
/// concurrent launches.
#[derive(Debug, Clone)]
pub struct BuildkiteClient {
    /// Base URL of the REST API (e.g., "https://api.buildkite.com/v2")
    api_url: String,
    org_slug: String,
    pipeline_slug: String,
    /// API access token, sent as a bearer token on API calls only
    token: String,
    /// HTTP client instance
    client: Client,
}

impl BuildkiteClient {
    /// Create a new client with its own connection pool
    ///
    /// # Arguments
    /// * `api_url` - Base URL of the REST API
    /// * `org_slug` - Organization slug
    /// * `pipeline_slug` - Pipeline that builds are created in
    /// * `token` - API access token
    /// * `timeout` - Per-request timeout
    pub fn new(
        api_url: impl Into<String>,
        org_slug: impl Into<String>,
        pipeline_slug: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self::with_client(
            api_url,
            org_slug,
            pipeline_slug,
            token,
            Self::http_client(timeout)?,
        ))
    }

    /// Create a new client around an existing HTTP client
    ///
    /// The client must be configured not to follow redirects, otherwise the
    /// API token would be replayed against object storage. Use
    /// [`BuildkiteClient::http_client`] to build one.
    pub fn with_client(
        api_url: impl Into<String>,
        org_slug: impl Into<String>,
        pipeline_slug: impl Into<String>,
        token: impl Into<String>,
        client: Client,
    ) -> Self {
        let api_url = api_url.into();
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            org_slug: org_slug.into(),
            pipeline_slug: pipeline_slug.into(),
            token: token.into(),
            client,
        }
    }

    /// Builds an HTTP client suitable for [`BuildkiteClient::with_client`]
    pub fn http_client(timeout: Duration) -> Result<Client> {
        Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::InvalidRequest(format!("Failed to build HTTP client: {}", e)))
    }

    /// Get the base URL of the API
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn org_slug(&self) -> &str {
        &self.org_slug
    }

    pub fn pipeline_slug(&self) -> &str {
        &self.pipeline_slug
    }

    fn organization_url(&self) -> String {
        format!("{}/organizations/{}", self.api_url, self.org_slug)
    }

    fn pipeline_url(&self) -> String {
        format!("{}/pipelines/{}", self.organization_url(), self.pipeline_slug)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and deserialize the JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = self.check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Check the status code of a response whose body is not needed
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        self.check_status(response).await.map(|_| ())
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response)
    }
}
