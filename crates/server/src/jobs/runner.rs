// crates/server/src/jobs/runner.rs
//! Central job runner that spawns and supervises download workers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::Semaphore;

use reelgrab_core::MediaFetcher;

use super::reporter::ProgressReporter;
use super::store::JobStore;
use super::types::{JobId, JobStatus, JobUpdate};
use super::worker::{self, DownloadRequest, JobOutcome};
use crate::metrics;

/// Reasons a submission is refused before a worker starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Download {0} is already in progress")]
    AlreadyRunning(JobId),
}

/// Central job runner that owns one worker per submitted job.
///
/// Each worker is the only writer of its job's store entry for as long as
/// it runs; the runner refuses a second submission for an id whose job has
/// not reached a terminal status. Workers run inside a supervisor task that
/// turns a panic into an `error` status.
///
/// Active ids are tagged with a generation so a late release from a
/// finished job never frees the id of its resubmitted successor.
pub struct JobRunner {
    store: Arc<dyn JobStore>,
    fetcher: Arc<dyn MediaFetcher>,
    active: Arc<Mutex<HashMap<JobId, u64>>>,
    next_generation: AtomicU64,
    slots: Option<Arc<Semaphore>>,
}

impl JobRunner {
    /// Create a runner. `max_concurrent` of 0 means unbounded.
    pub fn new(
        store: Arc<dyn JobStore>,
        fetcher: Arc<dyn MediaFetcher>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            store,
            fetcher,
            active: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
            slots: (max_concurrent > 0).then(|| Arc::new(Semaphore::new(max_concurrent))),
        }
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    fn active(&self) -> MutexGuard<'_, HashMap<JobId, u64>> {
        lock_active(&self.active)
    }

    /// Whether a worker for `id` is still running.
    pub fn is_active(&self, id: &str) -> bool {
        self.active().contains_key(id)
    }

    /// Number of live workers (running or waiting for a slot).
    pub fn active_count(&self) -> usize {
        self.active().len()
    }

    /// Register the job in the store and spawn its worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, request: DownloadRequest) -> Result<(), SubmitError> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        {
            let mut active = self.active();
            // A job that already published its terminal status has no
            // writes left, even if its task has not unwound yet.
            if active.contains_key(&request.id) && !self.store.get(&request.id).status.is_terminal() {
                return Err(SubmitError::AlreadyRunning(request.id));
            }
            active.insert(request.id.clone(), generation);
        }

        self.store.create_or_reset(&request.id);
        metrics::record_job_started(request.format.as_str());
        tracing::info!(
            download_id = %request.id,
            url = %request.url,
            format = %request.format,
            dir = %request.target_dir.display(),
            "download job submitted"
        );

        let id = request.id.clone();
        let store = Arc::clone(&self.store);
        let fetcher = Arc::clone(&self.fetcher);
        let slots = self.slots.clone();
        let worker_active = Arc::clone(&self.active);

        let worker = tokio::spawn(async move {
            let reporter = ProgressReporter::new(request.id.clone(), store);

            let _permit = match slots {
                Some(slots) => {
                    if slots.available_permits() == 0 {
                        reporter.update(
                            JobStatus::Starting,
                            0.0,
                            "Waiting for a free download slot...",
                        );
                    }
                    slots.acquire_owned().await.ok()
                }
                None => None,
            };

            metrics::worker_started();
            let outcome = worker::run(&request, fetcher.as_ref(), &reporter).await;
            metrics::worker_stopped();
            release(&worker_active, &request.id, generation);
            outcome
        });

        // Supervisor: record the outcome; on a panic, report and release the id.
        let store = Arc::clone(&self.store);
        let active = Arc::clone(&self.active);
        tokio::spawn(async move {
            match worker.await {
                Ok(JobOutcome::Finished { succeeded, .. }) => {
                    metrics::record_job_finished(succeeded);
                }
                Ok(JobOutcome::Failed { .. }) => {
                    metrics::record_job_failed();
                }
                Err(join_err) => {
                    // The worker's reporter died with it, so this is the
                    // only remaining writer for the id.
                    metrics::worker_stopped();
                    metrics::record_job_failed();
                    tracing::error!(download_id = %id, error = %join_err, "download worker crashed");
                    let last = store.get(&id);
                    store.update(
                        &id,
                        JobUpdate::new(
                            JobStatus::Error,
                            last.progress,
                            "Internal error while processing download",
                        )
                        .items(last.current_item, last.total_items, last.item_name)
                        .failed(last.failed_items),
                    );
                    release(&active, &id, generation);
                }
            }
        });

        Ok(())
    }
}

/// Free `id` if it still belongs to `generation`.
fn release(active: &Mutex<HashMap<JobId, u64>>, id: &str, generation: u64) {
    let mut active = lock_active(active);
    if active.get(id) == Some(&generation) {
        active.remove(id);
    }
}

fn lock_active(active: &Mutex<HashMap<JobId, u64>>) -> MutexGuard<'_, HashMap<JobId, u64>> {
    active.lock().unwrap_or_else(|poisoned| {
        tracing::error!("Mutex poisoned on active job set, recovering");
        poisoned.into_inner()
    })
}
