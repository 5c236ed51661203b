// crates/server/src/main.rs
//! Reelgrab server binary.
//!
//! Parses configuration, installs logging and metrics, then serves the
//! download API until the process is stopped.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use reelgrab_core::YtDlpFetcher;
use reelgrab_server::{create_app, init_metrics, spawn_eviction_sweeper, AppState, ServerConfig};

const DEFAULT_LOG_FILTER: &str = "warn,reelgrab_server=info,reelgrab_core=info";

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();

    init_metrics();

    let fetcher = Arc::new(YtDlpFetcher::new(config.ytdlp_path.clone()));
    let state = AppState::new(fetcher, config.job_settings(), config.max_concurrent_jobs);

    if let Some(every) = config.sweep_interval() {
        spawn_eviction_sweeper(state.clone(), every);
    }

    let app = create_app(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        %addr,
        version = env!("CARGO_PKG_VERSION"),
        download_dir = %config.download_dir.display(),
        retention_secs = config.retention_secs,
        max_concurrent_jobs = config.max_concurrent_jobs,
        ytdlp = %config.ytdlp_path,
        "reelgrab listening"
    );
    eprintln!("\n  reelgrab v{} ready at http://{addr}\n", env!("CARGO_PKG_VERSION"));

    axum::serve(listener, app).await?;
    Ok(())
}
