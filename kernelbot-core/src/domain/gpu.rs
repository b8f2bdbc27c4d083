//! GPU classes and their routing keys
//!
//! A GPU class is routed to compute through a backend queue. Resolution uses an
//! explicit table first and falls back to a slug derived from the class name,
//! so every non-empty class name maps to exactly one queue.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Built-in GPU class to queue table
const DEFAULT_QUEUES: &[(&str, &str)] = &[
    ("B200_BK", "b200"),
    ("H100_BK", "h100"),
    ("MI300_BK", "mi300"),
    // Test infrastructure
    ("L40S_BK", "test"),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GpuError {
    #[error("GPU class name is empty")]
    EmptyName,

    #[error("GPU class '{0}' does not resolve to a queue")]
    Unroutable(String),
}

/// A GPU class together with the queue that routes jobs to it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GpuDescriptor {
    pub name: String,
    pub queue: String,
}

impl std::fmt::Display for GpuDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (queue {})", self.name, self.queue)
    }
}

/// Lookup table from GPU class names to queues
#[derive(Debug, Clone)]
pub struct GpuCatalog {
    queues: HashMap<String, String>,
}

impl GpuCatalog {
    /// Creates a catalog containing only the built-in table
    pub fn new() -> Self {
        let queues = DEFAULT_QUEUES
            .iter()
            .map(|(name, queue)| (name.to_string(), queue.to_string()))
            .collect();
        Self { queues }
    }

    /// Adds or replaces an explicit mapping
    pub fn with_queue(mut self, name: impl Into<String>, queue: impl Into<String>) -> Self {
        self.queues.insert(name.into(), queue.into());
        self
    }

    /// Resolves a GPU class name to its descriptor
    pub fn resolve(&self, name: &str) -> Result<GpuDescriptor, GpuError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GpuError::EmptyName);
        }

        let queue = match self.queues.get(name) {
            Some(queue) => queue.clone(),
            None => derive_queue(name),
        };

        if queue.is_empty() {
            return Err(GpuError::Unroutable(name.to_string()));
        }

        Ok(GpuDescriptor {
            name: name.to_string(),
            queue,
        })
    }

    /// Names with an explicit mapping, sorted
    pub fn known_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.queues.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for GpuCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Fallback queue for a class missing from the table: lower-cased, `_bk` suffix dropped
pub fn derive_queue(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    lower
        .strip_suffix("_bk")
        .unwrap_or(&lower)
        .to_string()
}
