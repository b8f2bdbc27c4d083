//! Build-related API endpoints

use kernelbot_core::dto::build::{Build, CreateBuild};
use tracing::debug;

use crate::BuildkiteClient;
use crate::error::Result;

impl BuildkiteClient {
    // =============================================================================
    // Build Lifecycle
    // =============================================================================

    /// Create a build in the configured pipeline
    ///
    /// # Arguments
    /// * `req` - The build creation request
    ///
    /// # Returns
    /// The created build, in whatever state the backend reports right away
    pub async fn create_build(&self, req: &CreateBuild) -> Result<Build> {
        let url = format!("{}/builds", self.pipeline_url());
        debug!("Creating build at {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a build by its API URL
    ///
    /// # Arguments
    /// * `build_url` - The `url` field returned when the build was created
    pub async fn get_build(&self, build_url: &str) -> Result<Build> {
        let response = self
            .client
            .get(build_url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Request cancellation of a build
    ///
    /// Cancellation is asynchronous on the backend; a successful call does
    /// not mean the build has stopped. Cancelling a build that already
    /// finished is rejected by the API with a 4xx status.
    pub async fn cancel_build(&self, build_url: &str) -> Result<()> {
        let url = format!("{}/cancel", build_url.trim_end_matches('/'));
        debug!("Cancelling build at {}", url);

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use crate::test_server::FakeBuildkite;
    use kernelbot_core::dto::build::CreateBuild;
    use std::collections::BTreeMap;

    fn request() -> CreateBuild {
        let mut env = BTreeMap::new();
        env.insert("KERNELBOT_RUN_ID".to_string(), "sub-1-L40S_BK".to_string());
        env.insert("KERNELBOT_QUEUE".to_string(), "test".to_string());

        CreateBuild {
            commit: "HEAD".to_string(),
            branch: "main".to_string(),
            message: "Kernel eval: sub-1-L40S_BK".to_string(),
            env,
            meta_data: BTreeMap::new(),
            steps: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_build() {
        let server = FakeBuildkite::start().await;
        let client = server.client();

        let build = client.create_build(&request()).await.unwrap();
        assert_eq!(build.number, 1);
        assert_eq!(build.state, "scheduled");

        let created = server.created_builds();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].env["KERNELBOT_QUEUE"], "test");

        let polled = client.get_build(&build.url).await.unwrap();
        assert_eq!(polled.state, "passed");
        assert_eq!(polled.artifact_sources().len(), 1);
    }

    #[tokio::test]
    async fn test_create_build_with_bad_token_is_api_error() {
        let server = FakeBuildkite::start().await;
        let client = server.client_with_token("wrong");

        let err = client.create_build(&request()).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_cancel_build() {
        let server = FakeBuildkite::start().await;
        let client = server.client();

        let build = client.create_build(&request()).await.unwrap();
        client.cancel_build(&build.url).await.unwrap();
        assert_eq!(server.cancel_calls(), 1);

        // a second cancel is rejected by the API but stays harmless
        let err = client.cancel_build(&build.url).await.unwrap_err();
        assert_eq!(err.status(), Some(422));
        assert_eq!(server.cancel_calls(), 2);
    }
}
