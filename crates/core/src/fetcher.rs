// crates/core/src/fetcher.rs
//! MediaFetcher trait defining the interface to the external download tool.

use async_trait::async_trait;
use std::path::Path;

use crate::error::FetchError;
use crate::media::{ByteProgress, MediaFormat, MediaInfo};

/// Callback invoked with raw byte counters while a transfer runs.
pub type ProgressCallback<'a> = &'a (dyn Fn(ByteProgress) + Send + Sync);

/// External media extraction/download collaborator.
///
/// Implementations include:
/// - `YtDlpFetcher` - spawns the `yt-dlp` binary
/// - test doubles that script metadata and progress in-process
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Resolve a URL into a single item or a playlist without downloading.
    async fn extract(&self, url: &str) -> Result<MediaInfo, FetchError>;

    /// Download one item into `dir`, transcoding according to `format`,
    /// reporting byte counters through `on_progress`.
    async fn download(
        &self,
        url: &str,
        format: MediaFormat,
        dir: &Path,
        on_progress: ProgressCallback<'_>,
    ) -> Result<(), FetchError>;

    /// Fetcher name for logging (e.g. "yt-dlp").
    fn name(&self) -> &str;
}
