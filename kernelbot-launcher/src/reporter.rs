//! Progress reporting
//!
//! A launch narrates its progress to a [`ProgressReporter`]: `push` starts a
//! new status line, `update` replaces the current one (the chat front end edits
//! its last message). Reporting is advisory. Every call is bounded by
//! [`REPORT_TIMEOUT`], so a slow reporter cannot stall polling, and nothing a
//! reporter does changes the outcome of a launch.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Upper bound on a single reporter call
pub const REPORT_TIMEOUT: Duration = Duration::from_secs(2);

/// Receiver of human-readable launch progress
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// Starts a new status line
    async fn push(&self, message: &str);

    /// Replaces the current status line
    async fn update(&self, message: &str);
}

/// Runs a reporter call, giving up after [`REPORT_TIMEOUT`]
pub(crate) async fn notify(call: impl Future<Output = ()>) {
    if tokio::time::timeout(REPORT_TIMEOUT, call).await.is_err() {
        debug!("Progress reporter did not respond within {:?}", REPORT_TIMEOUT);
    }
}

/// Discards all progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

#[async_trait]
impl ProgressReporter for NullReporter {
    async fn push(&self, _message: &str) {}

    async fn update(&self, _message: &str) {}
}

/// Logs progress through `tracing`
#[derive(Debug, Clone)]
pub struct TracingReporter {
    title: String,
}

impl TracingReporter {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }
}

#[async_trait]
impl ProgressReporter for TracingReporter {
    async fn push(&self, message: &str) {
        info!(title = %self.title, "{}", message);
    }

    async fn update(&self, message: &str) {
        info!(title = %self.title, "{}", message);
    }
}

/// A progress message as delivered by [`ChannelReporter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Push(String),
    Update(String),
}

/// Forwards progress into an unbounded channel
///
/// Sending never waits. Events are dropped once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelReporter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ProgressReporter for ChannelReporter {
    async fn push(&self, message: &str) {
        let _ = self.tx.send(ProgressEvent::Push(message.to_string()));
    }

    async fn update(&self, message: &str) {
        let _ = self.tx.send(ProgressEvent::Update(message.to_string()));
    }
}
