//! Agent DTOs and queue summaries

use serde::{Deserialize, Serialize};

/// A build agent as listed by the organization agents endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    #[serde(default)]
    pub connection_state: String,
    /// `key=value` tags, e.g. `queue=h100`
    #[serde(default)]
    pub metadata: Vec<String>,
    /// Job currently assigned, if any
    #[serde(default)]
    pub job: Option<serde_json::Value>,
}

impl Agent {
    /// Value of a `key=value` metadata tag
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.iter().find_map(|tag| {
            let (k, v) = tag.split_once('=')?;
            (k == key).then_some(v)
        })
    }

    pub fn is_busy(&self) -> bool {
        self.job.as_ref().is_some_and(|job| !job.is_null())
    }
}

/// Summary of one agent in a queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub name: String,
    pub state: String,
    pub busy: bool,
    pub gpu_index: Option<String>,
}

/// Occupancy of a queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub queue: String,
    pub total: usize,
    pub idle: usize,
    pub agents: Vec<AgentSummary>,
}

impl QueueStatus {
    /// Summarizes the agents tagged with `queue=<queue>`
    pub fn from_agents(queue: &str, agents: &[Agent]) -> Self {
        let agents: Vec<AgentSummary> = agents
            .iter()
            .filter(|agent| agent.meta("queue") == Some(queue))
            .map(|agent| AgentSummary {
                name: agent.name.clone(),
                state: agent.connection_state.clone(),
                busy: agent.is_busy(),
                gpu_index: agent.meta("gpu-index").map(str::to_string),
            })
            .collect();

        Self {
            queue: queue.to_string(),
            total: agents.len(),
            idle: agents.iter().filter(|a| !a.busy).count(),
            agents,
        }
    }
}
