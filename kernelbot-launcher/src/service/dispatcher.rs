//! Build dispatcher
//!
//! Resolves a GPU class to its queue and creates the remote build. Creation
//! is attempted once: a rejected submission (bad credentials, bad payload)
//! is not expected to succeed on retry.

use kernelbot_core::{GpuCatalog, GpuDescriptor, GpuError};
use tracing::{debug, error, info};

use crate::backend::{BuildBackend, BuildSubmission, Submitted};
use crate::error::LaunchError;

#[derive(Debug, Clone, Default)]
pub struct BuildDispatcher {
    catalog: GpuCatalog,
}

impl BuildDispatcher {
    pub fn new(catalog: GpuCatalog) -> Self {
        Self { catalog }
    }

    /// Resolves a GPU class name to its queue
    ///
    /// Names outside the catalog fall back to the derived queue.
    pub fn resolve(&self, gpu: &str) -> Result<GpuDescriptor, GpuError> {
        let descriptor = self.catalog.resolve(gpu)?;
        let known = self.catalog.known_names();
        if !known.contains(&descriptor.name.as_str()) {
            debug!(
                "GPU {} is not in the catalog ({}), routing to queue {}",
                descriptor.name,
                known.join(", "),
                descriptor.queue
            );
        }
        Ok(descriptor)
    }

    /// Creates the remote build for an encoded payload
    pub async fn submit<B: BuildBackend + ?Sized>(
        &self,
        backend: &B,
        token: &str,
        gpu: &GpuDescriptor,
        run_id: &str,
        steps: Option<Vec<serde_json::Value>>,
    ) -> Result<Submitted, LaunchError> {
        info!(
            "Submitting job {} to {} queue {}",
            run_id,
            backend.name(),
            gpu.queue
        );

        let submission = BuildSubmission {
            run_id: run_id.to_string(),
            gpu: gpu.clone(),
            payload: token.to_string(),
            steps,
        };

        let submitted = backend.submit(&submission).await.map_err(|e| {
            error!("Failed to create build for {}: {}", run_id, e);
            LaunchError::Dispatch(e)
        })?;

        info!(
            "Build #{} created for {}: {}",
            submitted.build.number, run_id, submitted.build.web_url
        );

        Ok(submitted)
    }
}
