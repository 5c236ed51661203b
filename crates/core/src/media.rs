// crates/core/src/media.rs
//! Media metadata and transfer types exchanged with a fetcher.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output container requested by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    /// Best mp4 video merged with m4a audio.
    #[default]
    Mp4,
    /// Audio only, transcoded to mp3.
    Mp3,
}

impl MediaFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFormat::Mp4 => "mp4",
            MediaFormat::Mp3 => "mp3",
        }
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4" => Ok(MediaFormat::Mp4),
            "mp3" => Ok(MediaFormat::Mp3),
            other => Err(format!("unsupported format '{other}' (expected mp4 or mp3)")),
        }
    }
}

/// One downloadable entry of a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    pub title: Option<String>,
    /// `None` when the extractor listed the entry without a usable URL.
    pub url: Option<String>,
}

/// What the extractor resolved a URL into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaInfo {
    Single { title: Option<String> },
    Playlist { title: Option<String>, entries: Vec<MediaEntry> },
}

/// Raw byte counters reported while a transfer is running.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ByteProgress {
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    pub total_bytes_estimate: Option<u64>,
}

impl ByteProgress {
    /// Percentage of the current item transferred, in `[0, 100]`.
    ///
    /// Falls back to the size estimate when the exact size is unknown and
    /// yields 0 when neither is known (or both are zero).
    pub fn percent(&self) -> f64 {
        let total = self
            .total_bytes
            .filter(|t| *t > 0)
            .or(self.total_bytes_estimate)
            .unwrap_or(0);
        if total == 0 {
            return 0.0;
        }
        (self.downloaded_bytes as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
    }
}
