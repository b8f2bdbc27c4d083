//! Launch flow
//!
//! One launch from payload to result: encode, submit, poll, retrieve, parse.
//! Each stage's failure is turned into a failed [`FullResult`] carrying the
//! stage's message, so callers always get a result back.

use kernelbot_core::codec::{self, DEFAULT_MAX_TOKEN_BYTES};
use kernelbot_core::{BuildState, FullResult, GpuDescriptor, parser};
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::backend::BuildBackend;
use crate::error::LaunchError;
use crate::reporter::{ProgressReporter, notify};
use crate::scheduler::{PollLoop, PollOutcome};
use crate::service::{ArtifactRetriever, BuildDispatcher};

/// Message used when a result declares failure without saying why
const GENERIC_FAILURE: &str = "Remote evaluation reported failure";

pub struct LaunchFlow<'a, B: BuildBackend + ?Sized> {
    backend: &'a B,
    dispatcher: &'a BuildDispatcher,
    poller: PollLoop,
    retriever: ArtifactRetriever,
    max_payload_bytes: usize,
}

impl<'a, B: BuildBackend + ?Sized> LaunchFlow<'a, B> {
    pub fn new(backend: &'a B, dispatcher: &'a BuildDispatcher, poller: PollLoop) -> Self {
        Self {
            backend,
            dispatcher,
            poller,
            retriever: ArtifactRetriever::new(),
            max_payload_bytes: DEFAULT_MAX_TOKEN_BYTES,
        }
    }

    pub fn with_max_payload_bytes(mut self, limit: usize) -> Self {
        self.max_payload_bytes = limit;
        self
    }

    /// Runs one launch to completion
    pub async fn run<P, R>(
        &self,
        run_id: &str,
        payload: &P,
        gpu: &GpuDescriptor,
        reporter: &R,
        steps: Option<Vec<Value>>,
    ) -> FullResult
    where
        P: Serialize + Sync + ?Sized,
        R: ProgressReporter + ?Sized,
    {
        match self.try_run(run_id, payload, gpu, reporter, steps).await {
            Ok(result) => {
                info!("Launch {} finished (success: {})", run_id, result.success);
                result
            }
            Err(e) => {
                error!("Launch {} failed: {}", run_id, e);
                notify(reporter.update(&format!("❌ {}", e))).await;
                FullResult::failure(e.to_string())
            }
        }
    }

    async fn try_run<P, R>(
        &self,
        run_id: &str,
        payload: &P,
        gpu: &GpuDescriptor,
        reporter: &R,
        steps: Option<Vec<Value>>,
    ) -> Result<FullResult, LaunchError>
    where
        P: Serialize + Sync + ?Sized,
        R: ProgressReporter + ?Sized,
    {
        let token = codec::encode_bounded(payload, self.max_payload_bytes)?;

        notify(reporter.push(&format!(
            "Submitting to {} queue: {}",
            self.backend.name(),
            gpu.queue
        )))
        .await;

        let submitted_at = Instant::now();
        let submitted = self
            .dispatcher
            .submit(self.backend, &token, gpu, run_id, steps)
            .await?;
        let build = submitted.build;

        notify(reporter.update(&format!(
            "Build created: [#{}](<{}>)",
            build.number, build.web_url
        )))
        .await;

        let snapshot = match self
            .poller
            .run(self.backend, &build, submitted.snapshot, submitted_at, reporter)
            .await
        {
            PollOutcome::Finished(snapshot) => snapshot,
            PollOutcome::TimedOut {
                waited,
                cancel_requested,
            } => {
                return Err(LaunchError::Timeout {
                    waited,
                    cancel_requested,
                });
            }
        };

        if snapshot.state != BuildState::Passed {
            return Err(LaunchError::Terminal(snapshot.state));
        }

        notify(reporter.update(&format!("✅ Build [#{}](<{}>) completed", build.number, build.web_url))).await;

        let retrieved = self.retriever.fetch(self.backend, &snapshot).await?;
        let mut result = parser::parse(&retrieved.result)?;

        if let Some(url) = retrieved.profile_url {
            for profile in result.runs.values_mut().filter_map(|run| run.profile.as_mut()) {
                if profile.download_url.is_none() {
                    profile.download_url = Some(url.clone());
                }
            }
        }

        if !result.success {
            warn!("Build #{} passed but its result reports failure", build.number);
            if result.error.is_none() {
                result.error = Some(GENERIC_FAILURE.to_string());
            }
        }

        Ok(result)
    }
}
