// crates/server/src/jobs/worker.rs
//! The download pipeline run by each job's worker.

use std::path::PathBuf;

use reelgrab_core::progress::{
    playlist_item_base, playlist_item_complete, EXTRACTING_PROGRESS, TRANSFER_START,
};
use reelgrab_core::{ensure_writable_dir, ByteProgress, FetchError, MediaFetcher, MediaFormat, MediaInfo};

use super::reporter::ProgressReporter;
use super::types::{JobId, JobStatus};

/// Everything a worker needs to process one submission.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub id: JobId,
    pub url: String,
    pub format: MediaFormat,
    pub target_dir: PathBuf,
}

/// How a worker's run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Finished { succeeded: u32, failed: u32 },
    Failed { message: String },
}

/// Run the whole job, leaving it in a terminal state.
pub async fn run(
    request: &DownloadRequest,
    fetcher: &dyn MediaFetcher,
    reporter: &ProgressReporter,
) -> JobOutcome {
    match process(request, fetcher, reporter).await {
        Ok(outcome) => outcome,
        Err(err) => {
            let message = err.user_message();
            tracing::warn!(
                download_id = %request.id,
                url = %request.url,
                error = %err,
                "download job failed"
            );
            reporter.fail(message.clone());
            JobOutcome::Failed { message }
        }
    }
}

async fn process(
    request: &DownloadRequest,
    fetcher: &dyn MediaFetcher,
    reporter: &ProgressReporter,
) -> Result<JobOutcome, FetchError> {
    reporter.update(JobStatus::Starting, 0.0, "Initializing download...");

    ensure_writable_dir(&request.target_dir).await?;

    reporter.update(
        JobStatus::Extracting,
        EXTRACTING_PROGRESS,
        "Extracting video information...",
    );
    let info = fetcher.extract(&request.url).await?;

    let on_progress = |bytes: ByteProgress| reporter.on_bytes(bytes);

    match info {
        MediaInfo::Single { title } => {
            let name = title.unwrap_or_else(|| "Video".to_string());
            reporter.set_item(1, 1, name.clone());
            reporter.update(
                JobStatus::Downloading,
                TRANSFER_START,
                format!("Downloading: {name}"),
            );

            fetcher
                .download(&request.url, request.format, &request.target_dir, &on_progress)
                .await?;

            reporter.finish("Download completed!");
            tracing::info!(download_id = %request.id, item = %name, "download finished");
            Ok(JobOutcome::Finished {
                succeeded: 1,
                failed: 0,
            })
        }
        MediaInfo::Playlist { entries, .. } => {
            let total = u32::try_from(entries.len()).unwrap_or(u32::MAX);
            reporter.set_item(0, total, "");
            reporter.update(
                JobStatus::DownloadingMultiple,
                TRANSFER_START,
                format!("Found {total} videos in playlist"),
            );

            let mut succeeded = 0u32;
            for (index, entry) in entries.iter().enumerate().take(total as usize) {
                let current = index as u32 + 1;
                let name = entry
                    .title
                    .clone()
                    .unwrap_or_else(|| format!("Video {current}"));

                reporter.set_item(current, total, name.clone());
                reporter.update(
                    JobStatus::DownloadingMultiple,
                    playlist_item_base(current, total),
                    format!("Downloading: {name}"),
                );

                let result = match &entry.url {
                    Some(url) => fetcher
                        .download(url, request.format, &request.target_dir, &on_progress)
                        .await
                        .map_err(|err| err.to_string()),
                    None => Err("entry has no URL".to_string()),
                };

                let message = match result {
                    Ok(()) => {
                        succeeded += 1;
                        format!("Completed: {name}")
                    }
                    Err(error) => {
                        let failed = reporter.record_failure();
                        crate::metrics::record_item_failed();
                        tracing::warn!(
                            download_id = %request.id,
                            item = %name,
                            url = entry.url.as_deref().unwrap_or("<none>"),
                            failed,
                            error = %error,
                            "playlist item failed, skipping"
                        );
                        format!("Failed: {name}")
                    }
                };

                reporter.update(
                    JobStatus::DownloadingMultiple,
                    playlist_item_complete(current, total),
                    message,
                );
            }

            let failed = reporter.failed_items();
            reporter.finish(completion_message(succeeded, total, failed));
            tracing::info!(
                download_id = %request.id,
                succeeded,
                failed,
                total,
                "playlist download finished"
            );
            Ok(JobOutcome::Finished { succeeded, failed })
        }
    }
}

fn completion_message(succeeded: u32, total: u32, failed: u32) -> String {
    let mut message = format!("Successfully downloaded {succeeded} of {total} videos!");
    if failed > 0 {
        message.push_str(&format!(" ({failed} failed)"));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::store::{InMemoryJobStore, JobStore};
    use crate::jobs::testing::ScriptedFetcher;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn setup() -> (
        Arc<InMemoryJobStore>,
        ProgressReporter,
        DownloadRequest,
        tempfile::TempDir,
    ) {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryJobStore::new());
        store.create_or_reset("job");
        let reporter = ProgressReporter::new("job", store.clone());
        let request = DownloadRequest {
            id: "job".into(),
            url: "https://media.test/watch?v=1".into(),
            format: MediaFormat::Mp4,
            target_dir: tmp.path().join("out"),
        };
        (store, reporter, request, tmp)
    }

    #[tokio::test]
    async fn test_single_item_finishes_at_100() {
        let fetcher = ScriptedFetcher::single("Clip");
        let (store, reporter, request, _tmp) = setup();

        let outcome = run(&request, &fetcher, &reporter).await;

        assert_eq!(outcome, JobOutcome::Finished { succeeded: 1, failed: 0 });
        let snap = store.get("job");
        assert_eq!(snap.status, JobStatus::Finished);
        assert_eq!(snap.progress, 100.0);
        assert_eq!(snap.message, "Download completed!");
        assert!(request.target_dir.is_dir());
    }

    #[tokio::test]
    async fn test_playlist_skips_failing_item() {
        let fetcher = ScriptedFetcher::playlist(&["One", "Two", "Three"]).failing_item("Two");
        let (store, reporter, request, _tmp) = setup();

        let outcome = run(&request, &fetcher, &reporter).await;

        assert_eq!(outcome, JobOutcome::Finished { succeeded: 2, failed: 1 });
        let snap = store.get("job");
        assert_eq!(snap.status, JobStatus::Finished);
        assert_eq!(snap.failed_items, 1);
        assert_eq!(snap.message, "Successfully downloaded 2 of 3 videos! (1 failed)");
    }

    #[tokio::test]
    async fn test_playlist_counts_entry_without_url_as_failed() {
        let fetcher = ScriptedFetcher::playlist(&["One", "Broken", "Three"]).without_url("Broken");
        let (store, reporter, request, _tmp) = setup();

        let outcome = run(&request, &fetcher, &reporter).await;

        assert_eq!(outcome, JobOutcome::Finished { succeeded: 2, failed: 1 });
        assert_eq!(fetcher.download_calls(), 2);
        let snap = store.get("job");
        assert_eq!(snap.status, JobStatus::Finished);
        assert_eq!(snap.total_items, 3);
        assert_eq!(snap.failed_items, 1);
        assert_eq!(snap.message, "Successfully downloaded 2 of 3 videos! (1 failed)");
    }

    #[tokio::test]
    async fn test_empty_playlist_finishes() {
        let fetcher = ScriptedFetcher::playlist(&[]);
        let (store, reporter, request, _tmp) = setup();

        let outcome = run(&request, &fetcher, &reporter).await;

        assert_eq!(outcome, JobOutcome::Finished { succeeded: 0, failed: 0 });
        assert_eq!(store.get("job").message, "Successfully downloaded 0 of 0 videos!");
    }

    #[tokio::test]
    async fn test_extraction_failure_uses_friendly_message() {
        let fetcher = ScriptedFetcher::extract_error("ERROR: [youtube] x: Video unavailable");
        let (store, reporter, request, _tmp) = setup();

        let outcome = run(&request, &fetcher, &reporter).await;

        assert_eq!(
            outcome,
            JobOutcome::Failed {
                message: "Video is unavailable or private".into()
            }
        );
        let snap = store.get("job");
        assert_eq!(snap.status, JobStatus::Error);
        assert_eq!(snap.progress, EXTRACTING_PROGRESS);
    }

    #[tokio::test]
    async fn test_unwritable_directory_fails_before_extraction() {
        let fetcher = ScriptedFetcher::single("Clip");
        let (store, reporter, mut request, tmp) = setup();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        request.target_dir = blocker;

        let outcome = run(&request, &fetcher, &reporter).await;

        assert!(matches!(outcome, JobOutcome::Failed { .. }));
        let snap = store.get("job");
        assert_eq!(snap.status, JobStatus::Error);
        assert!(snap.message.starts_with("Cannot access download directory"));
        assert_eq!(fetcher.extract_calls(), 0);
    }

    #[test]
    fn test_completion_message() {
        assert_eq!(completion_message(3, 3, 0), "Successfully downloaded 3 of 3 videos!");
        assert_eq!(
            completion_message(1, 3, 2),
            "Successfully downloaded 1 of 3 videos! (2 failed)"
        );
    }
}
