//! Build DTOs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::build::{BuildSnapshot, BuildState, RemoteBuild};

/// Request body for creating a build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBuild {
    pub commit: String,
    pub branch: String,
    pub message: String,
    /// Environment exported to every job of the build
    pub env: BTreeMap<String, String>,
    pub meta_data: BTreeMap<String, String>,
    /// Inline pipeline steps replacing the pipeline stored in the repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<serde_json::Value>>,
}

/// A build as returned by create and get
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Build {
    pub id: String,
    pub number: u64,
    pub url: String,
    pub web_url: String,
    pub state: String,
    #[serde(default)]
    pub jobs: Vec<BuildJob>,
}

/// A job inside a build
///
/// Waiter and block steps show up as jobs without an `artifacts_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildJob {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub artifacts_url: Option<String>,
}

impl Build {
    /// Artifact listing URLs of every job that has one
    pub fn artifact_sources(&self) -> Vec<String> {
        self.jobs
            .iter()
            .filter_map(|job| job.artifacts_url.clone())
            .collect()
    }

    /// Converts into the domain identity, given an already mapped state
    pub fn into_remote(self, state: BuildState) -> RemoteBuild {
        RemoteBuild {
            id: self.id,
            number: self.number,
            url: self.url,
            web_url: self.web_url,
            state,
        }
    }

    pub fn snapshot(&self, state: BuildState) -> BuildSnapshot {
        BuildSnapshot {
            state,
            artifact_sources: self.artifact_sources(),
        }
    }
}
