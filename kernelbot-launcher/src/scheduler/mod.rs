//! Scheduler layer
//!
//! Drives a submitted build to a terminal state or to its deadline. Polls
//! are strictly sequential: the next poll starts only after the previous
//! one has returned or been abandoned.

pub mod poller;

pub use poller::{CANCEL_TIMEOUT, PollLoop, PollOutcome};
