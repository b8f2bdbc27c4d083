//! Core domain types
//!
//! These types describe one launch end to end: the request that is shipped to
//! the remote runner, the GPU class it targets, the build record the CI system
//! issues for it, and the normalized result that comes back.

pub mod build;
pub mod gpu;
pub mod request;
pub mod result;
