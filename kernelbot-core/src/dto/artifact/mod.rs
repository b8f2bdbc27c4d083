//! Artifact DTOs

use serde::{Deserialize, Serialize};

/// A file uploaded by a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    #[serde(default)]
    pub job_id: Option<String>,
    pub filename: String,
    /// Path relative to the job's working directory
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub file_size: u64,
    pub download_url: String,
}
