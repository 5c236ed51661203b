// crates/server/src/lib.rs
//! Reelgrab server library.
//!
//! Axum HTTP server that accepts media download submissions, runs each one
//! as a background job, and serves per-job progress to pollers.

pub mod config;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod routes;
pub mod state;

pub use config::{JobSettings, ServerConfig};
pub use error::*;
pub use metrics::{init_metrics, render_metrics};
pub use routes::app_routes;
pub use state::AppState;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - Page, download, progress, and log routes
/// - CORS (allows any origin)
/// - Request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(app_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Periodically evict expired job records so an idle server doesn't
/// hold them until the next page load or poll.
pub fn spawn_eviction_sweeper(state: Arc<AppState>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = state.evict_expired();
            if evicted > 0 {
                tracing::info!(evicted, "eviction sweep removed expired records");
            }
        }
    })
}
