//! HTTP route handlers for the reelgrab server.

pub mod download;
pub mod health;
pub mod index;
pub mod log;
pub mod metrics;
pub mod progress;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined router.
///
/// Routes:
/// - GET  / - Submission page
/// - POST /download - Start a download job
/// - GET  /progress?download_id=<id> - Poll a job
/// - POST /log - Browser console relay
/// - GET  /api/health - Health check
/// - GET  /metrics - Prometheus metrics
pub fn app_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(index::router())
        .merge(download::router())
        .merge(progress::router())
        .merge(log::router())
        .nest("/api", health::router())
        .merge(metrics::router())
        .with_state(state)
}
