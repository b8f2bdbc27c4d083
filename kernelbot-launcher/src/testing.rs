//! In-memory doubles for launch tests

use async_trait::async_trait;
use kernelbot_client::{ClientError, Download, Result};
use kernelbot_core::dto::artifact::Artifact;
use kernelbot_core::{BuildSnapshot, BuildState, RemoteBuild};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::backend::{BuildBackend, BuildSubmission, Submitted};
use crate::reporter::{ProgressEvent, ProgressReporter};

/// One scripted answer to a poll
#[derive(Debug, Clone)]
pub enum PollStep {
    State(BuildState),
    Error(u16),
}

/// How the first download leg behaves
#[derive(Debug, Clone)]
pub enum DownloadBehavior {
    Content(Vec<u8>),
    /// Redirect to storage, which serves these bytes
    Redirect(Vec<u8>),
    /// The API itself answers with this status
    ApiStatus(u16),
    /// Redirect to storage, which answers with this status
    StorageStatus(u16),
}

pub fn artifact(filename: &str, path: &str) -> Artifact {
    Artifact {
        id: format!("artifact-{filename}"),
        job_id: Some("job-1".to_string()),
        filename: filename.to_string(),
        path: path.to_string(),
        file_size: 0,
        download_url: format!("mem://download/{filename}"),
    }
}

pub fn passing_result() -> Vec<u8> {
    br#"{
        "success": true,
        "error": "",
        "system": {"gpu": "NVIDIA H100", "device_count": 1},
        "runs": {
            "test": {
                "start": "2026-03-01T10:00:00+00:00",
                "end": "2026-03-01T10:00:05+00:00",
                "compilation": null,
                "run": {"success": true, "passed": true, "duration": 1.5, "result": {"check": "pass"}},
                "profile": null
            }
        }
    }"#
    .to_vec()
}

#[derive(Default)]
struct Counters {
    submits: usize,
    polls: usize,
    lists: usize,
    downloads: usize,
    presigned: usize,
    cancels: usize,
}

#[derive(Default)]
struct State {
    counters: Counters,
    submissions: Vec<BuildSubmission>,
    /// Poll cursor and run id per build number
    builds: HashMap<u64, (usize, String)>,
}

/// Scripted [`BuildBackend`]
///
/// Each poll of a build consumes the next step of its script; the last step
/// repeats forever. Scripts can be set per run id so concurrent launches on
/// one backend see different builds.
pub struct ScriptedBackend {
    initial: BuildState,
    script: Vec<PollStep>,
    run_scripts: HashMap<String, Vec<PollStep>>,
    run_results: HashMap<String, Vec<u8>>,
    artifacts: Option<Vec<Artifact>>,
    download: DownloadBehavior,
    reject_status: Option<u16>,
    poll_delay: Duration,
    state: Mutex<State>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<PollStep>) -> Self {
        Self {
            initial: BuildState::Scheduled,
            script,
            run_scripts: HashMap::new(),
            run_results: HashMap::new(),
            artifacts: None,
            download: DownloadBehavior::Redirect(passing_result()),
            reject_status: None,
            poll_delay: Duration::ZERO,
            state: Mutex::new(State::default()),
        }
    }

    /// Polls answer `states` in order
    pub fn states(states: &[BuildState]) -> Self {
        Self::new(states.iter().copied().map(PollStep::State).collect())
    }

    pub fn with_initial(mut self, state: BuildState) -> Self {
        self.initial = state;
        self
    }

    pub fn with_run(mut self, run_id: &str, script: Vec<PollStep>, result: Vec<u8>) -> Self {
        self.run_scripts.insert(run_id.to_string(), script);
        self.run_results.insert(run_id.to_string(), result);
        self
    }

    pub fn with_artifacts(mut self, artifacts: Vec<Artifact>) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    pub fn with_download(mut self, download: DownloadBehavior) -> Self {
        self.download = download;
        self
    }

    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    pub fn reject_submissions(mut self, status: u16) -> Self {
        self.reject_status = Some(status);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn submissions(&self) -> Vec<BuildSubmission> {
        self.lock().submissions.clone()
    }

    pub fn submit_calls(&self) -> usize {
        self.lock().counters.submits
    }

    pub fn poll_calls(&self) -> usize {
        self.lock().counters.polls
    }

    pub fn list_calls(&self) -> usize {
        self.lock().counters.lists
    }

    pub fn download_calls(&self) -> usize {
        self.lock().counters.downloads
    }

    pub fn presigned_calls(&self) -> usize {
        self.lock().counters.presigned
    }

    pub fn cancel_calls(&self) -> usize {
        self.lock().counters.cancels
    }

    /// Number, run id and poll count of every submitted build
    pub fn builds(&self) -> Vec<(u64, String, usize)> {
        let mut builds: Vec<_> = self
            .lock()
            .builds
            .iter()
            .map(|(number, (polls, run_id))| (*number, run_id.clone(), *polls))
            .collect();
        builds.sort();
        builds
    }

    fn snapshot(number: u64, state: BuildState) -> BuildSnapshot {
        BuildSnapshot {
            state,
            artifact_sources: vec![format!("mem://builds/{number}/artifacts")],
        }
    }

    fn build_number(url: &str) -> Option<u64> {
        url.strip_prefix("mem://builds/")?
            .split('/')
            .next()?
            .parse()
            .ok()
    }

    fn result_for(&self, url: &str) -> Option<Vec<u8>> {
        let number = Self::build_number(url)?;
        let state = self.lock();
        let (_, run_id) = state.builds.get(&number)?;
        self.run_results.get(run_id).cloned()
    }
}

#[async_trait]
impl BuildBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn submit(&self, submission: &BuildSubmission) -> Result<Submitted> {
        let mut state = self.lock();
        state.counters.submits += 1;
        state.submissions.push(submission.clone());

        if let Some(status) = self.reject_status {
            return Err(ClientError::api_error(status, "submission rejected"));
        }

        let number = state.submissions.len() as u64;
        state.builds.insert(number, (0, submission.run_id.clone()));

        let build = RemoteBuild {
            id: format!("build-{number}"),
            number,
            url: format!("mem://builds/{number}"),
            web_url: format!("https://buildkite.example/builds/{number}"),
            state: self.initial,
        };
        Ok(Submitted {
            snapshot: Self::snapshot(number, self.initial),
            build,
        })
    }

    async fn poll(&self, build: &RemoteBuild) -> Result<BuildSnapshot> {
        let step = {
            let mut state = self.lock();
            state.counters.polls += 1;
            let entry = state
                .builds
                .get_mut(&build.number)
                .expect("poll of an unknown build");
            let script = self.run_scripts.get(&entry.1).unwrap_or(&self.script);
            let step = script
                .get(entry.0)
                .or_else(|| script.last())
                .cloned()
                .unwrap_or(PollStep::State(BuildState::Running));
            entry.0 += 1;
            step
        };

        if !self.poll_delay.is_zero() {
            tokio::time::sleep(self.poll_delay).await;
        }

        match step {
            PollStep::State(s) => Ok(Self::snapshot(build.number, s)),
            PollStep::Error(status) => Err(ClientError::api_error(status, "scripted poll failure")),
        }
    }

    async fn list_artifacts(&self, snapshot: &BuildSnapshot) -> Result<Vec<Artifact>> {
        self.lock().counters.lists += 1;
        if let Some(artifacts) = &self.artifacts {
            return Ok(artifacts.clone());
        }

        Ok(snapshot
            .artifact_sources
            .iter()
            .map(|source| {
                let mut result = artifact("result.json", "result.json");
                result.download_url = source.replace("/artifacts", "/download/result.json");
                result
            })
            .collect())
    }

    async fn download(&self, artifact: &Artifact) -> Result<Download> {
        self.lock().counters.downloads += 1;
        if let Some(bytes) = self.result_for(&artifact.download_url) {
            return Ok(Download::Content(bytes));
        }

        match &self.download {
            DownloadBehavior::Content(bytes) => Ok(Download::Content(bytes.clone())),
            DownloadBehavior::Redirect(_) | DownloadBehavior::StorageStatus(_) => {
                Ok(Download::Redirect("mem://store/result?sig=abc".to_string()))
            }
            DownloadBehavior::ApiStatus(status) => {
                Err(ClientError::api_error(*status, "scripted download failure"))
            }
        }
    }

    async fn fetch_presigned(&self, _url: &str) -> Result<Vec<u8>> {
        self.lock().counters.presigned += 1;
        match &self.download {
            DownloadBehavior::Redirect(bytes) => Ok(bytes.clone()),
            DownloadBehavior::StorageStatus(status) => {
                Err(ClientError::api_error(*status, "AccessDenied"))
            }
            _ => Err(ClientError::api_error(404, "no such object")),
        }
    }

    async fn cancel(&self, _build: &RemoteBuild) -> Result<()> {
        self.lock().counters.cancels += 1;
        Ok(())
    }
}

/// Records progress, optionally taking its time about it
#[derive(Default)]
pub struct RecordingReporter {
    delay: Duration,
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    async fn record(&self, event: ProgressEvent) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl ProgressReporter for RecordingReporter {
    async fn push(&self, message: &str) {
        self.record(ProgressEvent::Push(message.to_string())).await;
    }

    async fn update(&self, message: &str) {
        self.record(ProgressEvent::Update(message.to_string())).await;
    }
}
