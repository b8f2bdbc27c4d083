//! `result.json` parser
//!
//! Turns the raw artifact written by the remote runner into a [`FullResult`].
//! Unknown fields are ignored. A timestamp that cannot be parsed fails the
//! whole call: a half-parsed artifact is never reported as a result.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::result::{
    CompileResult, EvalResult, FullResult, ProfileResult, RunResult, SystemInfo,
};

/// Name of the artifact holding the evaluation result
pub const RESULT_ARTIFACT: &str = "result.json";

#[derive(Debug, Error)]
pub enum ResultParseError {
    #[error("malformed result artifact: {0}")]
    Json(#[from] serde_json::Error),

    #[error("run '{run}' has an invalid {field} timestamp '{value}'")]
    Timestamp {
        run: String,
        field: &'static str,
        value: String,
    },
}

#[derive(Deserialize)]
struct RawResult {
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    runs: HashMap<String, RawRun>,
    #[serde(default)]
    system: Option<SystemInfo>,
}

#[derive(Deserialize)]
struct RawRun {
    start: String,
    end: String,
    #[serde(default)]
    compilation: Option<CompileResult>,
    #[serde(default)]
    run: Option<RunResult>,
    #[serde(default)]
    profile: Option<ProfileResult>,
}

/// Parses the bytes of a `result.json` artifact
pub fn parse(raw: &[u8]) -> Result<FullResult, ResultParseError> {
    let raw: RawResult = serde_json::from_slice(raw)?;

    let mut runs = HashMap::with_capacity(raw.runs.len());
    for (name, run) in raw.runs {
        let start = parse_timestamp(&name, "start", &run.start)?;
        let end = parse_timestamp(&name, "end", &run.end)?;
        runs.insert(
            name,
            EvalResult {
                start,
                end,
                compilation: run.compilation,
                run: run.run,
                profile: run.profile,
            },
        );
    }

    Ok(FullResult {
        success: raw.success,
        error: raw.error.filter(|e| !e.is_empty()),
        runs,
        system: raw.system.unwrap_or_default(),
    })
}

/// Accepts RFC 3339 and offset-less ISO 8601 (taken as UTC)
fn parse_timestamp(run: &str, field: &'static str, value: &str) -> Result<DateTime<Utc>, ResultParseError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| ResultParseError::Timestamp {
            run: run.to_string(),
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixture() -> serde_json::Value {
        json!({
            "success": true,
            "error": "",
            "runs": {
                "test": {
                    "start": "2025-06-01T12:00:00.250000+00:00",
                    "end": "2025-06-01T12:00:04.500000+00:00",
                    "compilation": null,
                    "run": {
                        "success": true,
                        "passed": true,
                        "command": "python eval.py test",
                        "stdout": "",
                        "stderr": "",
                        "exit_code": 0,
                        "duration": 4.25,
                        "result": {"check": "pass", "test-count": "3"}
                    },
                    "profile": null
                },
                "benchmark": {
                    "start": "2025-06-01T12:00:05",
                    "end": "2025-06-01T12:01:05.123456",
                    "compilation": {"nvcc_found": true, "success": true, "exit_code": 0},
                    "run": {"success": true, "passed": false, "exit_code": 1, "duration": 60.0}
                }
            },
            "system": {"gpu": "NVIDIA L40S", "platform": "Linux-6.8", "device_count": 1, "kernel": "ignored"}
        })
    }

    #[test]
    fn test_parse_full_fixture() {
        let raw = serde_json::to_vec(&fixture()).unwrap();
        let result = parse(&raw).unwrap();

        assert!(result.success);
        assert_eq!(result.error, None);
        assert_eq!(result.runs.len(), 2);
        assert_eq!(result.system.gpu, "NVIDIA L40S");

        let test = &result.runs["test"];
        assert!(test.passed());
        assert!(test.compilation.is_none());
        assert!(test.profile.is_none());
        assert_eq!(test.run.as_ref().unwrap().result["test-count"], "3");
        assert!(test.start < test.end);

        let bench = &result.runs["benchmark"];
        assert!(!bench.passed());
        assert!(bench.compilation.as_ref().unwrap().nvcc_found);
        assert_eq!(bench.start, Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 5).unwrap());
    }

    #[test]
    fn test_absent_sub_results_stay_absent() {
        let raw = br#"{"success": true, "runs": {"test": {"start": "2025-06-01T00:00:00Z", "end": "2025-06-01T00:00:01Z"}}}"#;
        let result = parse(raw).unwrap();
        let test = &result.runs["test"];
        assert!(test.compilation.is_none());
        assert!(test.run.is_none());
        assert!(test.profile.is_none());
        assert_eq!(result.system, SystemInfo::default());
    }

    #[test]
    fn test_bad_timestamp_is_fatal() {
        let raw = br#"{"success": true, "runs": {"test": {"start": "yesterday", "end": "2025-06-01T00:00:01Z"}}}"#;
        match parse(raw) {
            Err(ResultParseError::Timestamp { run, field, value }) => {
                assert_eq!(run, "test");
                assert_eq!(field, "start");
                assert_eq!(value, "yesterday");
            }
            other => panic!("expected timestamp error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_success_is_malformed() {
        assert!(matches!(parse(br#"{"runs": {}}"#), Err(ResultParseError::Json(_))));
        assert!(matches!(parse(b"<html>"), Err(ResultParseError::Json(_))));
    }

    #[test]
    fn test_runner_reported_failure() {
        let raw = br#"{"success": false, "error": "Runner error: boom", "runs": {}, "system": {}}"#;
        let result = parse(raw).unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Runner error: boom"));
    }
}
