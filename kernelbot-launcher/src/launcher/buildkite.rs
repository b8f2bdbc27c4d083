//! Buildkite launcher

use async_trait::async_trait;
use kernelbot_core::dto::agent::QueueStatus;
use kernelbot_core::{EvaluationRequest, FullResult, GpuCatalog, GpuDescriptor};
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{LaunchFlow, Launcher};
use crate::backend::BuildkiteBackend;
use crate::config::BuildkiteConfig;
use crate::error::ConfigError;
use crate::reporter::ProgressReporter;
use crate::scheduler::PollLoop;
use crate::service::BuildDispatcher;
use crate::smoke::smoke_test_steps;

/// Launches evaluations as Buildkite builds
///
/// The HTTP client is created on first use and shared by every launch made
/// through this launcher; [`BuildkiteLauncher::shutdown`] releases it.
pub struct BuildkiteLauncher {
    config: BuildkiteConfig,
    dispatcher: BuildDispatcher,
    backend: OnceCell<BuildkiteBackend>,
}

impl BuildkiteLauncher {
    pub fn new(config: BuildkiteConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            dispatcher: BuildDispatcher::default(),
            backend: OnceCell::new(),
        })
    }

    /// Replaces the GPU routing table
    pub fn with_catalog(mut self, catalog: GpuCatalog) -> Self {
        self.dispatcher = BuildDispatcher::new(catalog);
        self
    }

    pub fn config(&self) -> &BuildkiteConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.backend.initialized()
    }

    async fn backend(&self) -> kernelbot_client::Result<&BuildkiteBackend> {
        self.backend
            .get_or_try_init(|| async {
                debug!("Creating Buildkite client for {}", self.config.api_url);
                BuildkiteBackend::connect(&self.config)
            })
            .await
    }

    fn flow<'a>(&'a self, backend: &'a BuildkiteBackend) -> LaunchFlow<'a, BuildkiteBackend> {
        LaunchFlow::new(backend, &self.dispatcher, PollLoop::from_config(&self.config))
            .with_max_payload_bytes(self.config.max_payload_bytes)
    }

    /// Same as [`Launcher::launch`], under an explicit run id
    pub async fn launch_as(
        &self,
        request: &EvaluationRequest,
        gpu: &str,
        run_id: &str,
        reporter: &dyn ProgressReporter,
    ) -> Result<FullResult, ConfigError> {
        let gpu = self.dispatcher.resolve(gpu)?;
        self.run_request(request, &gpu, run_id, reporter).await
    }

    async fn run_request(
        &self,
        request: &EvaluationRequest,
        gpu: &GpuDescriptor,
        run_id: &str,
        reporter: &dyn ProgressReporter,
    ) -> Result<FullResult, ConfigError> {
        let backend = self.backend().await?;
        Ok(self
            .flow(backend)
            .run(run_id, request, gpu, reporter, None)
            .await)
    }

    /// Runs the inline smoke-test pipeline on `queue`
    pub async fn smoke_test(
        &self,
        queue: &str,
        run_id: &str,
        reporter: &dyn ProgressReporter,
    ) -> Result<FullResult, ConfigError> {
        let backend = self.backend().await?;
        let gpu = GpuDescriptor {
            name: queue.to_string(),
            queue: queue.to_string(),
        };
        let payload = json!({ "run_id": run_id, "smoke_test": true });

        info!("Starting smoke test {} on queue {}", run_id, queue);
        Ok(self
            .flow(backend)
            .run(run_id, &payload, &gpu, reporter, Some(smoke_test_steps(queue)))
            .await)
    }

    /// Summarizes the agents serving `queue`
    pub async fn queue_status(&self, queue: &str) -> kernelbot_client::Result<QueueStatus> {
        let agents = self.backend().await?.client().list_agents().await?;
        Ok(QueueStatus::from_agents(queue, &agents))
    }

    /// Releases the HTTP client. A later launch creates a new one.
    pub fn shutdown(&mut self) {
        if self.backend.take().is_some() {
            info!("Buildkite client closed");
        }
    }
}

#[async_trait]
impl Launcher for BuildkiteLauncher {
    fn name(&self) -> &str {
        "Buildkite"
    }

    async fn launch(
        &self,
        request: &EvaluationRequest,
        gpu: &str,
        reporter: &dyn ProgressReporter,
    ) -> Result<FullResult, ConfigError> {
        let gpu = self.dispatcher.resolve(gpu)?;
        let run_id = request.run_id(&gpu.name);
        self.run_request(request, &gpu, &run_id, reporter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::NullReporter;
    use kernelbot_client::test_server::FakeBuildkite;
    use kernelbot_core::{GpuError, codec};
    use std::time::Duration;

    fn config(fake: &FakeBuildkite) -> BuildkiteConfig {
        let mut config = BuildkiteConfig::new("acme", "kernelbot", FakeBuildkite::TOKEN);
        config.api_url = fake.base().to_string();
        config.poll_interval = Duration::from_millis(20);
        config.max_wait = Duration::from_secs(5);
        config.request_timeout = Duration::from_secs(5);
        config
    }

    #[tokio::test]
    async fn test_launch_end_to_end() {
        let fake = FakeBuildkite::start().await;
        let launcher = BuildkiteLauncher::new(config(&fake)).unwrap();
        let request = EvaluationRequest::new("py", "eval.py", "print('hi')").with_submission_id(7);

        let result = launcher
            .launch(&request, "H100_BK", &NullReporter)
            .await
            .unwrap();

        assert!(result.success, "{:?}", result.error);
        assert!(launcher.is_connected());

        let created = fake.created_builds();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].env["KERNELBOT_QUEUE"], "h100");
        assert_eq!(created[0].env["KERNELBOT_RUN_ID"], "sub-7-H100_BK");
        assert!(created[0].steps.is_none());

        let decoded: EvaluationRequest = codec::decode(&created[0].env["KERNELBOT_PAYLOAD"]).unwrap();
        assert_eq!(decoded, request);

        // storage rejects Authorization, so one hit means the header was dropped
        assert_eq!(fake.store_hits(), 1);
        assert_eq!(fake.cancel_calls(), 0);

        let profile = result.runs["profile"].profile.as_ref().unwrap();
        assert_eq!(profile.download_url, Some(fake.url("/download/trace")));
    }

    #[tokio::test]
    async fn test_timeout_cancels_build() {
        let fake = FakeBuildkite::start_with_states(&["running"]).await;
        let mut config = config(&fake);
        config.max_wait = Duration::from_millis(200);
        let launcher = BuildkiteLauncher::new(config).unwrap();
        let request = EvaluationRequest::new("py", "eval.py", "print('hi')");

        let result = launcher
            .launch(&request, "L40S_BK", &NullReporter)
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.error.unwrap().contains("timed out"));
        assert_eq!(fake.cancel_calls(), 1);
        assert_eq!(fake.store_hits(), 0);
    }

    #[tokio::test]
    async fn test_unroutable_gpu_is_config_error() {
        let fake = FakeBuildkite::start().await;
        let launcher = BuildkiteLauncher::new(config(&fake)).unwrap();
        let request = EvaluationRequest::new("py", "eval.py", "print('hi')");

        let err = launcher.launch(&request, "", &NullReporter).await.unwrap_err();

        assert!(matches!(err, ConfigError::Gpu(GpuError::EmptyName)));
        assert!(fake.created_builds().is_empty());
        assert!(!launcher.is_connected());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = BuildkiteConfig::new("acme", "kernelbot", "");
        assert!(matches!(
            BuildkiteLauncher::new(config),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_smoke_test_sends_inline_steps() {
        let fake = FakeBuildkite::start().await;
        let launcher = BuildkiteLauncher::new(config(&fake)).unwrap();

        let result = launcher
            .smoke_test("test", "manual-test", &NullReporter)
            .await
            .unwrap();

        assert!(result.success, "{:?}", result.error);
        let created = fake.created_builds();
        assert_eq!(created[0].env["KERNELBOT_QUEUE"], "test");
        assert_eq!(created[0].env["KERNELBOT_RUN_ID"], "manual-test");
        let steps = created[0].steps.as_ref().unwrap();
        assert_eq!(steps[0]["agents"]["queue"], "test");
    }

    #[tokio::test]
    async fn test_queue_status() {
        let fake = FakeBuildkite::start().await;
        let launcher = BuildkiteLauncher::new(config(&fake)).unwrap();

        let status = launcher.queue_status("test").await.unwrap();

        assert_eq!(status.total, 2);
        assert_eq!(status.idle, 1);
        assert_eq!(status.agents[0].gpu_index.as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn test_shutdown_releases_client() {
        let fake = FakeBuildkite::start().await;
        let mut launcher = BuildkiteLauncher::new(config(&fake)).unwrap();

        launcher.queue_status("test").await.unwrap();
        assert!(launcher.is_connected());

        launcher.shutdown();
        assert!(!launcher.is_connected());

        launcher.queue_status("test").await.unwrap();
        assert!(launcher.is_connected());
    }
}
