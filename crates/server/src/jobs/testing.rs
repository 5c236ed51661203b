// crates/server/src/jobs/testing.rs
//! In-process test doubles for the job system.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

use reelgrab_core::{
    ByteProgress, FetchError, MediaEntry, MediaFetcher, MediaFormat, MediaInfo, ProgressCallback,
};

use super::store::{InMemoryJobStore, JobStore};
use super::types::{JobSnapshot, JobStatus, JobUpdate};

/// Fetcher that replays scripted metadata and byte progress.
pub struct ScriptedFetcher {
    info: Result<MediaInfo, String>,
    failing: HashSet<String>,
    percent_steps: Vec<u64>,
    gate: Option<Arc<Semaphore>>,
    panic_on_download: bool,
    extract_calls: AtomicUsize,
    download_calls: AtomicUsize,
}

impl ScriptedFetcher {
    fn with_info(info: Result<MediaInfo, String>) -> Self {
        Self {
            info,
            failing: HashSet::new(),
            percent_steps: vec![25, 50, 75, 100],
            gate: None,
            panic_on_download: false,
            extract_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
        }
    }

    pub fn single(title: &str) -> Self {
        Self::with_info(Ok(MediaInfo::Single {
            title: Some(title.to_string()),
        }))
    }

    pub fn playlist(titles: &[&str]) -> Self {
        let entries = titles
            .iter()
            .enumerate()
            .map(|(i, t)| MediaEntry {
                title: Some(t.to_string()),
                url: Some(format!("https://media.test/item/{i}")),
            })
            .collect();
        Self::with_info(Ok(MediaInfo::Playlist {
            title: Some("Playlist".to_string()),
            entries,
        }))
    }

    pub fn extract_error(message: &str) -> Self {
        Self::with_info(Err(message.to_string()))
    }

    /// Make the download of the entry titled `title` fail.
    pub fn failing_item(mut self, title: &str) -> Self {
        self.failing.insert(title.to_string());
        self
    }

    /// Strip the URL from the playlist entry titled `title`.
    pub fn without_url(mut self, title: &str) -> Self {
        if let Ok(MediaInfo::Playlist { entries, .. }) = &mut self.info {
            for entry in entries.iter_mut().filter(|e| e.title.as_deref() == Some(title)) {
                entry.url = None;
            }
        }
        self
    }

    /// Hold every download until `gate` has permits.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_on_download = true;
        self
    }

    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    fn title_for(&self, url: &str) -> Option<String> {
        match &self.info {
            Ok(MediaInfo::Playlist { entries, .. }) => entries
                .iter()
                .find(|e| e.url.as_deref() == Some(url))
                .and_then(|e| e.title.clone()),
            Ok(MediaInfo::Single { title }) => title.clone(),
            Err(_) => None,
        }
    }
}

#[async_trait]
impl MediaFetcher for ScriptedFetcher {
    async fn extract(&self, _url: &str) -> Result<MediaInfo, FetchError> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        self.info.clone().map_err(FetchError::ToolFailed)
    }

    async fn download(
        &self,
        url: &str,
        _format: MediaFormat,
        _dir: &Path,
        on_progress: ProgressCallback<'_>,
    ) -> Result<(), FetchError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if self.panic_on_download {
            panic!("scripted fetcher panic");
        }
        if let Some(title) = self.title_for(url) {
            if self.failing.contains(&title) {
                return Err(FetchError::ToolFailed("ERROR: HTTP Error 403: Forbidden".into()));
            }
        }
        for percent in &self.percent_steps {
            on_progress(ByteProgress {
                downloaded_bytes: percent * 10,
                total_bytes: Some(1000),
                total_bytes_estimate: None,
            });
            tokio::task::yield_now().await;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Store wrapper that records every write, for ordering assertions.
#[derive(Default)]
pub struct RecordingStore {
    inner: InMemoryJobStore,
    history: Mutex<Vec<(String, JobStatus, f64)>>,
}

impl RecordingStore {
    pub fn history_for(&self, id: &str) -> Vec<(JobStatus, f64)> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .filter(|(job, _, _)| job == id)
            .map(|(_, status, progress)| (*status, *progress))
            .collect()
    }
}

impl JobStore for RecordingStore {
    fn create_or_reset(&self, id: &str) {
        self.inner.create_or_reset(id);
        self.history
            .lock()
            .unwrap()
            .push((id.to_string(), JobStatus::Starting, 0.0));
    }

    fn update(&self, id: &str, update: JobUpdate) {
        self.history
            .lock()
            .unwrap()
            .push((id.to_string(), update.status, update.progress));
        self.inner.update(id, update);
    }

    fn get(&self, id: &str) -> JobSnapshot {
        self.inner.get(id)
    }

    fn evict_older_than(&self, max_age: Duration) -> usize {
        self.inner.evict_older_than(max_age)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

/// Poll `store` until `id` reaches a terminal status or `timeout` passes.
pub async fn wait_for_terminal(store: &dyn JobStore, id: &str, timeout: Duration) -> JobSnapshot {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let snap = store.get(id);
        if snap.status.is_terminal() || tokio::time::Instant::now() >= deadline {
            return snap;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
