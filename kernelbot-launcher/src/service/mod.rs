//! Service layer
//!
//! Services hold the launch logic that sits on either side of polling:
//! routing and submitting a build, and retrieving its result artifact.
//! Both are written against [`BuildBackend`](crate::backend::BuildBackend)
//! so they serve every build system alike.

mod artifacts;
mod dispatcher;

pub use artifacts::{ArtifactRetriever, PROFILE_PREFIX, RetrievedArtifacts};
pub use dispatcher::BuildDispatcher;
