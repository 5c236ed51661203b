// crates/server/src/config.rs
//! Server configuration from command-line flags and environment.

use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 2070;

/// Web front-end for downloading media through yt-dlp.
#[derive(Debug, Clone, Parser)]
#[command(name = "reelgrab", version, about, long_about = None)]
pub struct ServerConfig {
    /// Address to bind.
    #[arg(long, env = "REELGRAB_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on (falls back to `PORT`).
    #[arg(long, env = "REELGRAB_PORT")]
    pub port: Option<u16>,

    /// Directory used when a submission has no custom path.
    #[arg(long, env = "REELGRAB_DOWNLOAD_DIR", default_value = "./music")]
    pub download_dir: PathBuf,

    /// Seconds a job record is kept before eviction.
    #[arg(long, env = "REELGRAB_RETENTION_SECS", default_value_t = 3600)]
    pub retention_secs: u64,

    /// Seconds between background eviction sweeps (0 disables the sweeper).
    #[arg(long, env = "REELGRAB_SWEEP_INTERVAL_SECS", default_value_t = 300)]
    pub sweep_interval_secs: u64,

    /// Maximum concurrently downloading jobs (0 = unbounded).
    #[arg(long, env = "REELGRAB_MAX_CONCURRENT_JOBS", default_value_t = 0)]
    pub max_concurrent_jobs: usize,

    /// yt-dlp executable name or path.
    #[arg(long, env = "REELGRAB_YTDLP", default_value = "yt-dlp")]
    pub ytdlp_path: String,
}

impl ServerConfig {
    /// Resolved port: `--port`/`REELGRAB_PORT`, then `PORT`, then the default.
    pub fn port(&self) -> u16 {
        self.port
            .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
            .unwrap_or(DEFAULT_PORT)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port())
    }

    pub fn job_settings(&self) -> JobSettings {
        JobSettings {
            default_dir: self.download_dir.clone(),
            retention: Duration::from_secs(self.retention_secs),
        }
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

/// Settings the HTTP layer needs when accepting and serving jobs.
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub default_dir: PathBuf,
    pub retention: Duration,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            default_dir: PathBuf::from("./music"),
            retention: Duration::from_secs(3600),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["reelgrab"]).unwrap();
        assert_eq!(config.host.to_string(), "0.0.0.0");
        assert_eq!(config.download_dir, PathBuf::from("./music"));
        assert_eq!(config.retention_secs, 3600);
        assert_eq!(config.max_concurrent_jobs, 0);
        assert_eq!(config.ytdlp_path, "yt-dlp");
        assert_eq!(config.sweep_interval(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_flags_override() {
        let config = ServerConfig::try_parse_from([
            "reelgrab",
            "--port",
            "8080",
            "--retention-secs",
            "60",
            "--sweep-interval-secs",
            "0",
            "--max-concurrent-jobs",
            "3",
        ])
        .unwrap();
        assert_eq!(config.port(), 8080);
        assert_eq!(config.job_settings().retention, Duration::from_secs(60));
        assert_eq!(config.sweep_interval(), None);
        assert_eq!(config.max_concurrent_jobs, 3);
    }

    #[test]
    fn test_rejects_bad_host() {
        assert!(ServerConfig::try_parse_from(["reelgrab", "--host", "not-an-ip"]).is_err());
    }
}
