// crates/server/src/jobs/reporter.rs
//! Per-job progress writer.
//!
//! Every write for one job, from the worker's main sequence and from the
//! fetcher's byte callback alike, goes through the job's `ProgressReporter`.
//! Writes are serialized by its mutex and the published progress never
//! decreases.

use std::sync::{Arc, Mutex, MutexGuard};

use reelgrab_core::progress::{playlist_progress, single_item_progress, transfer_message};
use reelgrab_core::ByteProgress;

use super::store::JobStore;
use super::types::{JobStatus, JobUpdate};

struct ReporterState {
    status: JobStatus,
    progress: f64,
    current_item: u32,
    total_items: u32,
    item_name: String,
    failed_items: u32,
}

/// Single writer for one job's store entry.
pub struct ProgressReporter {
    id: String,
    store: Arc<dyn JobStore>,
    state: Mutex<ReporterState>,
}

impl ProgressReporter {
    pub fn new(id: impl Into<String>, store: Arc<dyn JobStore>) -> Self {
        Self {
            id: id.into(),
            store,
            state: Mutex::new(ReporterState {
                status: JobStatus::Starting,
                progress: 0.0,
                current_item: 0,
                total_items: 1,
                item_name: String::new(),
                failed_items: 0,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> MutexGuard<'_, ReporterState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            tracing::error!(download_id = %self.id, "Mutex poisoned on progress reporter, recovering");
            poisoned.into_inner()
        })
    }

    /// Set the item currently being processed.
    pub fn set_item(&self, current_item: u32, total_items: u32, item_name: impl Into<String>) {
        let mut state = self.state();
        state.current_item = current_item;
        state.total_items = total_items;
        state.item_name = item_name.into();
    }

    /// Count one playlist item as failed.
    pub fn record_failure(&self) -> u32 {
        let mut state = self.state();
        state.failed_items += 1;
        state.failed_items
    }

    /// Publish a status transition with the current item context.
    pub fn update(&self, status: JobStatus, progress: f64, message: impl Into<String>) {
        let mut state = self.state();
        self.publish(&mut state, status, progress, message.into());
    }

    /// Translate raw byte counters from the fetcher into a progress update.
    pub fn on_bytes(&self, bytes: ByteProgress) {
        let percent = bytes.percent();
        let mut state = self.state();
        if state.status.is_terminal() {
            return;
        }

        let (status, progress) = if state.status == JobStatus::DownloadingMultiple {
            (
                JobStatus::DownloadingMultiple,
                playlist_progress(state.current_item, state.total_items, percent),
            )
        } else {
            (JobStatus::Downloading, single_item_progress(percent))
        };
        let name = if state.item_name.is_empty() {
            "Video".to_string()
        } else {
            state.item_name.clone()
        };
        self.publish(&mut state, status, progress, transfer_message(&name, percent));
    }

    /// Mark the job `finished` at 100%.
    pub fn finish(&self, message: impl Into<String>) {
        self.update(JobStatus::Finished, reelgrab_core::progress::COMPLETE, message);
    }

    /// Mark the job `error`, keeping the progress reached so far.
    pub fn fail(&self, message: impl Into<String>) {
        let mut state = self.state();
        let progress = state.progress;
        self.publish(&mut state, JobStatus::Error, progress, message.into());
    }

    /// Last progress value written to the store.
    pub fn progress(&self) -> f64 {
        self.state().progress
    }

    pub fn failed_items(&self) -> u32 {
        self.state().failed_items
    }

    fn publish(&self, state: &mut ReporterState, status: JobStatus, progress: f64, message: String) {
        if state.status.is_terminal() && state.status != status {
            tracing::warn!(
                download_id = %self.id,
                from = state.status.as_str(),
                to = status.as_str(),
                "ignoring update after terminal status"
            );
            return;
        }

        let progress = if progress.is_nan() { state.progress } else { progress };
        state.progress = state.progress.max(progress).clamp(0.0, 100.0);
        state.status = status;

        self.store.update(
            &self.id,
            JobUpdate::new(status, state.progress, message)
                .items(state.current_item, state.total_items, state.item_name.clone())
                .failed(state.failed_items),
        );
    }
}
