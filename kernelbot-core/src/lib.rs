//! Kernelbot Core
//!
//! Core types and pure transformations for the kernelbot remote evaluation system.
//!
//! This crate contains:
//! - Domain types: evaluation requests, GPU descriptors, remote builds and results
//! - DTOs: wire shapes of the CI build system's REST API
//! - Codec: the compact payload token carried in build environment variables
//! - Parser: decoding of the `result.json` artifact into [`FullResult`]
//!
//! Nothing in here performs I/O. The HTTP client and the launcher live in their
//! own crates.

pub mod codec;
pub mod domain;
pub mod dto;
pub mod parser;

pub use domain::build::{BuildSnapshot, BuildState, RemoteBuild};
pub use domain::gpu::{GpuCatalog, GpuDescriptor, GpuError};
pub use domain::request::{EvaluationRequest, SubmissionMode};
pub use domain::result::{
    CompileResult, EvalResult, FullResult, ProfileResult, RunResult, SystemInfo,
};
