// crates/server/src/jobs/store.rs
//! Job store: the single source of truth for job state.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::types::{Job, JobSnapshot, JobStatus, JobUpdate};

/// Storage for download jobs, read by pollers and written by workers.
///
/// Implementations must make every method safe to call concurrently and
/// must never block readers behind I/O.
pub trait JobStore: Send + Sync {
    /// Insert `id` as `starting` with progress 0, keeping the original
    /// `created_at` when the id already exists.
    fn create_or_reset(&self, id: &str);

    /// Replace the mutable fields of `id`, inserting the job if absent.
    fn update(&self, id: &str, update: JobUpdate);

    /// Snapshot of `id`, or the `unknown` sentinel.
    fn get(&self, id: &str) -> JobSnapshot;

    /// Remove every job created before `now - max_age`. Returns the count.
    fn evict_older_than(&self, max_age: Duration) -> usize;

    /// Number of jobs currently held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `JobStore` backed by one mutex around a `HashMap`.
///
/// Job counts are small and writes are rare relative to download time, so
/// a single map-wide lock holding only field assignments is enough.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<String, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn jobs(&self) -> MutexGuard<'_, HashMap<String, Job>> {
        self.jobs.lock().unwrap_or_else(|poisoned| {
            tracing::error!("Mutex poisoned on job store, recovering");
            poisoned.into_inner()
        })
    }

    /// Remove every job created strictly before `cutoff`.
    pub fn evict_created_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut jobs = self.jobs();
        let before = jobs.len();
        jobs.retain(|_, job| job.created_at >= cutoff);
        before - jobs.len()
    }

    /// Creation time of `id`, if held.
    pub fn created_at(&self, id: &str) -> Option<DateTime<Utc>> {
        self.jobs().get(id).map(|job| job.created_at)
    }

    #[cfg(test)]
    pub(crate) fn backdate(&self, id: &str, by: chrono::Duration) {
        if let Some(job) = self.jobs().get_mut(id) {
            job.created_at -= by;
        }
    }
}

impl JobStore for InMemoryJobStore {
    fn create_or_reset(&self, id: &str) {
        self.update(
            id,
            JobUpdate::new(JobStatus::Starting, 0.0, "Starting download..."),
        );
    }

    fn update(&self, id: &str, update: JobUpdate) {
        let state = update.normalized();
        let mut jobs = self.jobs();
        match jobs.get_mut(id) {
            Some(job) => job.state = state,
            None => {
                jobs.insert(
                    id.to_string(),
                    Job {
                        state,
                        created_at: Utc::now(),
                    },
                );
            }
        }
    }

    fn get(&self, id: &str) -> JobSnapshot {
        self.jobs()
            .get(id)
            .map(Job::snapshot)
            .unwrap_or_else(JobSnapshot::not_found)
    }

    fn evict_older_than(&self, max_age: Duration) -> usize {
        let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
        let cutoff = Utc::now()
            .checked_sub_signed(max_age)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let evicted = self.evict_created_before(cutoff);
        if evicted > 0 {
            tracing::debug!(evicted, "evicted expired download jobs");
        }
        evicted
    }

    fn len(&self) -> usize {
        self.jobs().len()
    }
}
