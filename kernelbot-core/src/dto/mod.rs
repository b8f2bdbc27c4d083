//! Data Transfer Objects for the CI build system's REST API
//!
//! These mirror the JSON bodies exchanged with Buildkite's v2 API. Only fields
//! the launcher reads are declared; everything else is ignored on input.

pub mod agent;
pub mod artifact;
pub mod build;
