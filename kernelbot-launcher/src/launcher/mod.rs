//! Launch façade
//!
//! A [`Launcher`] turns an evaluation request and a GPU class into one
//! [`FullResult`]. Only configuration problems found before anything is
//! submitted are returned as errors; every later failure is reported inside
//! the result.

mod buildkite;
mod flow;

pub use buildkite::BuildkiteLauncher;
pub use flow::LaunchFlow;

use async_trait::async_trait;
use kernelbot_core::{EvaluationRequest, FullResult};

use crate::error::ConfigError;
use crate::reporter::ProgressReporter;

#[async_trait]
pub trait Launcher: Send + Sync {
    /// Name of the build system, used in status messages
    fn name(&self) -> &str;

    /// Runs `request` on the GPU class `gpu` and waits for its result
    async fn launch(
        &self,
        request: &EvaluationRequest,
        gpu: &str,
        reporter: &dyn ProgressReporter,
    ) -> Result<FullResult, ConfigError>;
}
