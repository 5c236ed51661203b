// crates/server/src/jobs/types.rs
//! Types for the download job system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier for a download job (client-supplied or a UUID).
pub type JobId = String;

/// Lifecycle status of a download job.
///
/// `starting → extracting → {downloading | downloading_multiple} → finished`,
/// with `error` reachable from any non-terminal state. `unknown` is only
/// ever returned for ids the store doesn't hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Starting,
    Extracting,
    Downloading,
    DownloadingMultiple,
    Finished,
    Error,
    Unknown,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Starting => "starting",
            JobStatus::Extracting => "extracting",
            JobStatus::Downloading => "downloading",
            JobStatus::DownloadingMultiple => "downloading_multiple",
            JobStatus::Finished => "finished",
            JobStatus::Error => "error",
            JobStatus::Unknown => "unknown",
        }
    }

    /// `finished` and `error` end a job's lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Error)
    }
}

/// Mutable fields written by a job's worker.
#[derive(Debug, Clone, PartialEq)]
pub struct JobUpdate {
    pub status: JobStatus,
    pub progress: f64,
    pub message: String,
    pub current_item: u32,
    pub total_items: u32,
    pub item_name: String,
    pub failed_items: u32,
}

impl JobUpdate {
    /// An update with no item context (`0 of 1`, no name, no failures).
    pub fn new(status: JobStatus, progress: f64, message: impl Into<String>) -> Self {
        Self {
            status,
            progress,
            message: message.into(),
            current_item: 0,
            total_items: 1,
            item_name: String::new(),
            failed_items: 0,
        }
    }

    pub fn items(mut self, current_item: u32, total_items: u32, item_name: impl Into<String>) -> Self {
        self.current_item = current_item;
        self.total_items = total_items;
        self.item_name = item_name.into();
        self
    }

    pub fn failed(mut self, failed_items: u32) -> Self {
        self.failed_items = failed_items;
        self
    }

    /// Enforce the `0 ≤ progress ≤ 100` and `current_item ≤ total_items`
    /// invariants.
    pub(crate) fn normalized(mut self) -> Self {
        self.progress = if self.progress.is_nan() {
            0.0
        } else {
            self.progress.clamp(0.0, 100.0)
        };
        self.current_item = self.current_item.min(self.total_items);
        self.failed_items = self.failed_items.min(self.total_items);
        self
    }
}

/// A stored job: the worker-owned fields plus its immutable creation time.
#[derive(Debug, Clone)]
pub struct Job {
    pub state: JobUpdate,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            status: self.state.status,
            progress: self.state.progress,
            message: self.state.message.clone(),
            current_item: self.state.current_item,
            total_items: self.state.total_items,
            item_name: self.state.item_name.clone(),
            failed_items: self.state.failed_items,
        }
    }
}

/// Point-in-time copy of a job returned to pollers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    pub progress: f64,
    pub message: String,
    pub current_item: u32,
    pub total_items: u32,
    pub item_name: String,
    pub failed_items: u32,
}

impl JobSnapshot {
    /// Sentinel returned for ids the store doesn't hold.
    pub fn not_found() -> Self {
        Self {
            status: JobStatus::Unknown,
            progress: 0.0,
            message: "Download not found".to_string(),
            current_item: 0,
            total_items: 0,
            item_name: String::new(),
            failed_items: 0,
        }
    }
}
