// crates/server/src/state.rs
//! Application state for the Axum server.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use reelgrab_core::MediaFetcher;

use crate::config::JobSettings;
use crate::jobs::{InMemoryJobStore, JobRunner, JobStore};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Job records read by pollers and written by workers.
    pub store: Arc<dyn JobStore>,
    /// Spawns one supervised worker per accepted download.
    pub runner: Arc<JobRunner>,
    /// Where downloads land when the client gives no custom path.
    pub default_dir: PathBuf,
    /// Age after which a job record is evicted.
    pub retention: Duration,
}

impl AppState {
    /// Create state backed by a fresh in-memory store.
    pub fn new(
        fetcher: Arc<dyn MediaFetcher>,
        settings: JobSettings,
        max_concurrent_jobs: usize,
    ) -> Arc<Self> {
        Self::with_store(
            Arc::new(InMemoryJobStore::new()),
            fetcher,
            settings,
            max_concurrent_jobs,
        )
    }

    /// Create state around an externally-owned store.
    pub fn with_store(
        store: Arc<dyn JobStore>,
        fetcher: Arc<dyn MediaFetcher>,
        settings: JobSettings,
        max_concurrent_jobs: usize,
    ) -> Arc<Self> {
        let runner = JobRunner::new(Arc::clone(&store), fetcher, max_concurrent_jobs);
        Arc::new(Self {
            start_time: Instant::now(),
            store,
            runner: Arc::new(runner),
            default_dir: settings.default_dir,
            retention: settings.retention,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn default_dir(&self) -> &Path {
        &self.default_dir
    }

    /// Drop job records older than the retention window.
    pub fn evict_expired(&self) -> usize {
        self.store.evict_older_than(self.retention)
    }

    #[cfg(test)]
    pub(crate) fn for_tests(fetcher: Arc<dyn MediaFetcher>, default_dir: &Path) -> Arc<Self> {
        Self::new(
            fetcher,
            JobSettings {
                default_dir: default_dir.to_path_buf(),
                ..JobSettings::default()
            },
            0,
        )
    }
}
