//! Evaluation request domain types

use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Wire names of the declared request fields. `extra` may not reuse them.
pub const REQUEST_FIELDS: &[&str] = &[
    "lang",
    "mode",
    "sources",
    "main",
    "tests",
    "benchmarks",
    "seed",
    "test_timeout",
    "benchmark_timeout",
    "ranked_timeout",
    "submission_id",
    "archive_blob",
];

/// Which kind of evaluation the remote runner should perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionMode {
    #[default]
    Test,
    Benchmark,
    Profile,
    Leaderboard,
}

impl SubmissionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Benchmark => "benchmark",
            Self::Profile => "profile",
            Self::Leaderboard => "leaderboard",
        }
    }
}

/// Everything the remote runner needs to compile, run and benchmark a submission
///
/// The launcher treats this as an opaque payload: it is encoded into a token,
/// carried through the build environment and decoded on the other side.
/// Fields the launcher does not know about are preserved in `extra`, so an
/// encode/decode round trip never drops data. Serialization fails when an
/// `extra` key shadows a declared field.
///
/// Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EvaluationRequest {
    /// Submission language, e.g. "py" or "cu"
    pub lang: String,

    #[serde(default)]
    pub mode: SubmissionMode,

    /// Source files keyed by file name
    #[serde(default)]
    pub sources: BTreeMap<String, String>,

    /// Entry point among `sources`
    #[serde(default)]
    pub main: String,

    #[serde(default)]
    pub tests: Vec<serde_json::Value>,

    #[serde(default)]
    pub benchmarks: Vec<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Per-mode timeouts in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranked_timeout: Option<u64>,

    /// Identifier of the submission in the leaderboard store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<i64>,

    /// Out-of-band reference to a large archive (e.g. a blob SHA).
    ///
    /// Binary archives must never be inlined: the token travels through an
    /// environment variable and is capped in size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_blob: Option<String>,

    #[serde(flatten, serialize_with = "serialize_extra")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn serialize_extra<S: Serializer>(
    extra: &serde_json::Map<String, serde_json::Value>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    if let Some(key) = extra.keys().find(|key| REQUEST_FIELDS.contains(&key.as_str())) {
        return Err(S::Error::custom(format!(
            "extra field `{key}` shadows a declared request field"
        )));
    }
    extra.serialize(serializer)
}

impl EvaluationRequest {
    /// Creates a request for a single-file submission
    pub fn new(lang: impl Into<String>, main: impl Into<String>, source: impl Into<String>) -> Self {
        let main = main.into();
        let mut sources = BTreeMap::new();
        sources.insert(main.clone(), source.into());
        Self {
            lang: lang.into(),
            main,
            sources,
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: SubmissionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_submission_id(mut self, id: i64) -> Self {
        self.submission_id = Some(id);
        self
    }

    /// Builds the run identifier used to label the remote build
    ///
    /// Format: `sub-{submission_id}-{gpu}`, with `unknown` when the request
    /// carries no submission id.
    pub fn run_id(&self, gpu_name: &str) -> String {
        match self.submission_id {
            Some(id) => format!("sub-{}-{}", id, gpu_name),
            None => format!("sub-unknown-{}", gpu_name),
        }
    }
}
