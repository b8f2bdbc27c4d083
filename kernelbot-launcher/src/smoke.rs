//! Smoke-test pipeline
//!
//! Inline steps that exercise submit, poll and artifact retrieval end to end
//! without a GPU workload: the job writes a minimal passing `result.json`
//! and uploads it.

use serde_json::{Value, json};

/// Image the smoke-test step runs in
pub const SMOKE_IMAGE: &str = "python:3.11-slim";

/// Minimal passing result written by the smoke-test job
pub fn smoke_result() -> Value {
    json!({
        "success": true,
        "error": "",
        "runs": {},
        "system": {
            "gpu": "unknown",
            "runtime": "smoke-test",
        },
    })
}

/// Inline steps for a smoke test on `queue`
pub fn smoke_test_steps(queue: &str) -> Vec<Value> {
    // Serialized JSON contains no single quotes, so it can be quoted verbatim.
    let result = smoke_result().to_string();

    vec![json!({
        "label": ":test_tube: Artifact Test",
        "agents": { "queue": queue },
        "plugins": [{
            "docker#v5.11.0": {
                "image": SMOKE_IMAGE,
                "propagate-environment": true,
                "environment": ["KERNELBOT_PAYLOAD", "KERNELBOT_RUN_ID", "NVIDIA_VISIBLE_DEVICES"],
            }
        }],
        "commands": [
            "echo \"Run ID: $${KERNELBOT_RUN_ID:-unknown}\"",
            "echo \"Payload: $${#KERNELBOT_PAYLOAD} bytes\"",
            format!("echo '{result}' > result.json"),
            "cat result.json",
        ],
        "artifact_paths": ["result.json"],
        "timeout_in_minutes": 5,
    })]
}
