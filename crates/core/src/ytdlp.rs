// crates/core/src/ytdlp.rs
//! yt-dlp fetcher - spawns the `yt-dlp` binary and parses its output.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command as TokioCommand;

use crate::error::FetchError;
use crate::fetcher::{MediaFetcher, ProgressCallback};
use crate::media::{ByteProgress, MediaEntry, MediaFormat, MediaInfo};

/// Marker prefixed to every progress line so it can be told apart from
/// anything else the tool prints on stdout.
const PROGRESS_MARKER: &str = "reelgrab-progress";

const MP4_FORMAT: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";
const MP3_FORMAT: &str = "bestaudio/best";
const MP3_QUALITY: &str = "192K";

/// Media fetcher backed by the `yt-dlp` command-line tool.
pub struct YtDlpFetcher {
    program: String,
}

impl YtDlpFetcher {
    /// Create a fetcher that runs `program` (a name on `PATH` or a full path).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self) -> TokioCommand {
        let mut cmd = TokioCommand::new(&self.program);
        // Null stdin so the child never blocks waiting for input
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }

    fn spawn_err(&self, source: std::io::Error) -> FetchError {
        tracing::error!(program = %self.program, error = %source, "yt-dlp: failed to spawn");
        FetchError::SpawnFailed {
            program: self.program.clone(),
            source,
        }
    }
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn extract(&self, url: &str) -> Result<MediaInfo, FetchError> {
        let t0 = std::time::Instant::now();
        tracing::info!(url = %url, "yt-dlp: extracting metadata");

        let output = self
            .command()
            .args(extract_args(url))
            .output()
            .await
            .map_err(|e| self.spawn_err(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(
                url = %url,
                exit_code = ?output.status.code(),
                stderr = %head(&stderr, 500),
                "yt-dlp: extraction failed"
            );
            return Err(FetchError::from_stderr(&stderr, output.status.code()));
        }

        let info = parse_info(&output.stdout)?;
        tracing::debug!(
            url = %url,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "yt-dlp: extraction complete"
        );
        Ok(info)
    }

    async fn download(
        &self,
        url: &str,
        format: MediaFormat,
        dir: &Path,
        on_progress: ProgressCallback<'_>,
    ) -> Result<(), FetchError> {
        tracing::info!(url = %url, format = %format, dir = %dir.display(), "yt-dlp: downloading");

        let mut child = self
            .command()
            .args(download_args(url, format, dir))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_err(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FetchError::InvalidOutput("failed to capture stdout".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| FetchError::InvalidOutput("failed to capture stderr".to_string()))?;

        // Drain stderr concurrently so a chatty child can't fill the pipe.
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        // Raw byte lines: a title with invalid UTF-8 must not stop the drain,
        // or the child blocks on a full pipe and never exits.
        let mut reader = BufReader::new(stdout);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break,
                Ok(_) => {
                    if let Some(progress) = parse_progress_line(&String::from_utf8_lossy(&line)) {
                        on_progress(progress);
                    }
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "yt-dlp: stdout read failed, closing pipe");
                    break;
                }
            }
        }
        // Closing our end lets a still-writing child exit on SIGPIPE.
        drop(reader);

        let status = child.wait().await.map_err(|e| self.spawn_err(e))?;
        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            tracing::warn!(
                url = %url,
                exit_code = ?status.code(),
                stderr = %head(&stderr, 500),
                "yt-dlp: download failed"
            );
            return Err(FetchError::from_stderr(&stderr, status.code()));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "yt-dlp"
    }
}

fn extract_args(url: &str) -> Vec<String> {
    vec![
        "--dump-single-json".into(),
        "--flat-playlist".into(),
        "--no-warnings".into(),
        "--".into(),
        url.into(),
    ]
}

fn download_args(url: &str, format: MediaFormat, dir: &Path) -> Vec<String> {
    let template = dir.join("%(title)s.%(ext)s");

    let mut args: Vec<String> = match format {
        MediaFormat::Mp4 => vec!["-f".into(), MP4_FORMAT.into()],
        MediaFormat::Mp3 => vec![
            "-f".into(),
            MP3_FORMAT.into(),
            "--extract-audio".into(),
            "--audio-format".into(),
            "mp3".into(),
            "--audio-quality".into(),
            MP3_QUALITY.into(),
        ],
    };

    args.extend(
        [
            "--no-playlist",
            "--no-warnings",
            "--quiet",
            "--progress",
            "--newline",
            "--progress-template",
        ]
        .map(String::from),
    );
    args.push(format!(
        "download:{PROGRESS_MARKER} %(progress.downloaded_bytes)s \
         %(progress.total_bytes)s %(progress.total_bytes_estimate)s"
    ));
    args.push("-o".into());
    args.push(template.to_string_lossy().into_owned());
    args.push("--".into());
    args.push(url.into());
    args
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char.
fn head(s: &str, max: usize) -> &str {
    let mut end = max.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Parse one stdout line produced by the progress template.
fn parse_progress_line(line: &str) -> Option<ByteProgress> {
    let mut fields = line.split_whitespace();
    if fields.next()? != PROGRESS_MARKER {
        return None;
    }
    let downloaded_bytes = parse_counter(fields.next()?).unwrap_or(0);
    let total_bytes = fields.next().and_then(parse_counter);
    let total_bytes_estimate = fields.next().and_then(parse_counter);
    Some(ByteProgress {
        downloaded_bytes,
        total_bytes,
        total_bytes_estimate,
    })
}

/// Counters print as integers, floats (estimates) or `NA`.
fn parse_counter(raw: &str) -> Option<u64> {
    let value: f64 = raw.parse().ok()?;
    (value.is_finite() && value >= 0.0).then(|| value as u64)
}

/// Turn `--dump-single-json` output into `MediaInfo`.
fn parse_info(stdout: &[u8]) -> Result<MediaInfo, FetchError> {
    let json: serde_json::Value =
        serde_json::from_slice(stdout).map_err(|e| FetchError::InvalidOutput(e.to_string()))?;

    let title = json
        .get("title")
        .and_then(|t| t.as_str())
        .map(str::to_string);

    let Some(entries) = json.get("entries").and_then(|e| e.as_array()) else {
        return Ok(MediaInfo::Single { title });
    };

    // Entries without a URL are kept so the worker counts them as failed.
    let entries = entries
        .iter()
        .filter(|e| !e.is_null())
        .map(|e| MediaEntry {
            title: e.get("title").and_then(|t| t.as_str()).map(str::to_string),
            url: e
                .get("webpage_url")
                .and_then(|u| u.as_str())
                .or_else(|| e.get("url").and_then(|u| u.as_str()))
                .map(str::to_string),
        })
        .collect();

    Ok(MediaInfo::Playlist { title, entries })
}
