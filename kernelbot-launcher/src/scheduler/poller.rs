//! Build poller
//!
//! Polls a build at a fixed interval until it reaches a terminal state or the
//! deadline passes. The deadline is measured from submission, so time spent
//! creating the build counts against it. Failed polls are logged and retried;
//! only the deadline ends the loop early.

use kernelbot_core::{BuildSnapshot, RemoteBuild};
use tokio::time::{self, Duration, Instant};
use tracing::{debug, info, warn};

use crate::backend::BuildBackend;
use crate::config::BuildkiteConfig;
use crate::error::LaunchError;
use crate::reporter::{ProgressReporter, notify};

/// Upper bound on the cancellation request sent after a timeout
pub const CANCEL_TIMEOUT: Duration = Duration::from_secs(10);

/// How a poll loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The build reached a terminal state
    Finished(BuildSnapshot),
    /// The deadline passed first
    TimedOut {
        waited: Duration,
        cancel_requested: bool,
    },
}

/// Poll loop settings for one launch
#[derive(Debug, Clone, Copy)]
pub struct PollLoop {
    interval: Duration,
    max_wait: Duration,
}

impl PollLoop {
    pub fn new(interval: Duration, max_wait: Duration) -> Self {
        Self { interval, max_wait }
    }

    pub fn from_config(config: &BuildkiteConfig) -> Self {
        Self::new(config.poll_interval, config.max_wait)
    }

    /// Polls `build` until it is terminal or `max_wait` has passed since
    /// `submitted_at`
    ///
    /// `initial` is the state reported at creation; a build that is already
    /// terminal is returned without polling. On timeout, exactly one
    /// cancellation is requested.
    pub async fn run<B, R>(
        &self,
        backend: &B,
        build: &RemoteBuild,
        initial: BuildSnapshot,
        submitted_at: Instant,
        reporter: &R,
    ) -> PollOutcome
    where
        B: BuildBackend + ?Sized,
        R: ProgressReporter + ?Sized,
    {
        if initial.state.is_terminal() {
            info!("Build #{} was {} on creation", build.number, initial.state);
            return PollOutcome::Finished(initial);
        }

        let deadline = submitted_at + self.max_wait;

        loop {
            if Instant::now() >= deadline {
                break;
            }

            match time::timeout_at(deadline, backend.poll(build)).await {
                Err(_) => {
                    debug!("Poll of build #{} outlived the deadline", build.number);
                    break;
                }
                Ok(Err(e)) => {
                    warn!("Build #{}: {}", build.number, LaunchError::PollTransient(e));
                }
                Ok(Ok(snapshot)) => {
                    let elapsed = submitted_at.elapsed();
                    debug!("Build #{} is {}", build.number, snapshot.state);

                    let message = format!(
                        "⏳ Build [#{}](<{}>): {} ({:.1}s)",
                        build.number,
                        build.web_url,
                        snapshot.state,
                        elapsed.as_secs_f64()
                    );
                    notify(reporter.update(&message)).await;

                    if snapshot.state.is_terminal() {
                        info!(
                            "Build #{} finished: {} after {:.1}s",
                            build.number,
                            snapshot.state,
                            elapsed.as_secs_f64()
                        );
                        return PollOutcome::Finished(snapshot);
                    }
                }
            }

            time::sleep_until((Instant::now() + self.interval).min(deadline)).await;
        }

        self.expire(backend, build, submitted_at).await
    }

    async fn expire<B: BuildBackend + ?Sized>(
        &self,
        backend: &B,
        build: &RemoteBuild,
        submitted_at: Instant,
    ) -> PollOutcome {
        let waited = submitted_at.elapsed();
        warn!(
            "Build #{} still running after {:.1}s, requesting cancellation",
            build.number,
            waited.as_secs_f64()
        );

        let cancel_requested = match time::timeout(CANCEL_TIMEOUT, backend.cancel(build)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("Failed to cancel build #{}: {}", build.number, e);
                false
            }
            Err(_) => {
                warn!("Cancellation of build #{} timed out", build.number);
                false
            }
        };

        PollOutcome::TimedOut {
            waited,
            cancel_requested,
        }
    }
}
