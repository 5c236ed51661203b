// crates/core/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a media fetcher while extracting or downloading.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to spawn {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    ToolFailed(String),

    #[error("Could not parse extractor output: {0}")]
    InvalidOutput(String),

    #[error("Cannot access download directory '{path}': {source}")]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Build a `ToolFailed` from captured stderr, keeping the last
    /// `ERROR:` line when the tool printed one.
    pub fn from_stderr(stderr: &str, exit_code: Option<i32>) -> Self {
        let error_line = stderr
            .lines()
            .rev()
            .find(|line| line.trim_start().starts_with("ERROR:"))
            .map(|line| line.trim().to_string());

        match error_line {
            Some(line) => Self::ToolFailed(line),
            None if !stderr.trim().is_empty() => Self::ToolFailed(stderr.trim().to_string()),
            None => Self::ToolFailed(format!(
                "extractor exited with status {}",
                exit_code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
            )),
        }
    }

    /// Message suitable for showing to the person who submitted the job.
    ///
    /// "Video unavailable" and network failures get friendlier phrasing;
    /// everything else surfaces the raw description.
    pub fn user_message(&self) -> String {
        friendly_message(&self.to_string())
    }
}

/// Map a raw failure description onto the text shown to clients.
pub fn friendly_message(raw: &str) -> String {
    if raw.contains("Video unavailable") {
        "Video is unavailable or private".to_string()
    } else if raw.to_lowercase().contains("network") {
        "Network error. Please check your connection.".to_string()
    } else {
        raw.to_string()
    }
}

/// Rejections produced while validating a client-supplied download path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("Invalid path: directory traversal not allowed")]
    Traversal,

    #[error("Invalid path format")]
    InvalidFormat,
}
