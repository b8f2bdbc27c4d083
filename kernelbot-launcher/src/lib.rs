//! Kernelbot Launcher
//!
//! Runs an evaluation request on remote GPU compute through a CI build system
//! and returns one normalized [`FullResult`](kernelbot_core::FullResult).
//!
//! Architecture:
//! - Backend: the minimal per-build-system client (submit, poll, list
//!   artifacts, download, cancel)
//! - Services: GPU routing and submission, artifact retrieval
//! - Scheduler: the poll loop that drives a build to a terminal state or a
//!   deadline
//! - Launcher: the façade composing the above; every failure after
//!   configuration comes back as a failed result, never as an error
//!
//! Launches are independent. Concurrent launches share only the pooled HTTP
//! client; within one launch, polls are strictly sequential.

pub mod backend;
pub mod config;
pub mod error;
pub mod launcher;
pub mod reporter;
pub mod scheduler;
pub mod service;
pub mod smoke;

#[cfg(test)]
mod testing;

pub use backend::{BuildBackend, BuildSubmission, Submitted};
pub use config::BuildkiteConfig;
pub use error::{ConfigError, LaunchError};
pub use launcher::{BuildkiteLauncher, LaunchFlow, Launcher};
pub use reporter::{ChannelReporter, NullReporter, ProgressEvent, ProgressReporter, TracingReporter};
pub use scheduler::{PollLoop, PollOutcome};
pub use service::{ArtifactRetriever, BuildDispatcher, RetrievedArtifacts};
