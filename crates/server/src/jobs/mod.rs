// crates/server/src/jobs/mod.rs
//! Background download job system.
//!
//! Provides:
//! - `JobStore` - injectable job state storage (`InMemoryJobStore`)
//! - `JobRunner` - spawns and supervises one worker per job
//! - `ProgressReporter` - serialized, monotonic per-job writer
//! - `JobSnapshot` - point-in-time job view served to pollers

pub mod reporter;
pub mod runner;
pub mod store;
pub mod types;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use reporter::ProgressReporter;
pub use runner::{JobRunner, SubmitError};
pub use store::{InMemoryJobStore, JobStore};
pub use types::{Job, JobId, JobSnapshot, JobStatus, JobUpdate};
pub use worker::{DownloadRequest, JobOutcome};
