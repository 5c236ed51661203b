// crates/server/src/routes/progress.rs
//! Progress polling endpoint.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::jobs::JobSnapshot;
use crate::metrics::RequestTimer;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    pub download_id: Option<String>,
}

/// GET /progress?download_id=<id> - current snapshot of one job.
///
/// Unknown (or already evicted) ids answer with status `unknown` rather
/// than an error, so a poller can tell "gone" from "bad request".
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProgressQuery>,
) -> ApiResult<Json<JobSnapshot>> {
    let timer = RequestTimer::new("progress");
    state.evict_expired();

    let Some(id) = query
        .download_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
    else {
        timer.finish(400);
        return Err(ApiError::BadRequest("No download ID provided".into()));
    };

    let snapshot = state.store.get(id);
    timer.finish(200);
    Ok(Json(snapshot))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/progress", get(get_progress))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::testing::ScriptedFetcher;
    use crate::jobs::{JobStatus, JobUpdate};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn app() -> (Arc<AppState>, Router) {
        let state = AppState::for_tests(
            Arc::new(ScriptedFetcher::single("Clip")),
            std::path::Path::new("./unused"),
        );
        let router = router().with_state(state.clone());
        (state, router)
    }

    #[tokio::test]
    async fn test_missing_id_is_bad_request() {
        let (_, app) = app();
        let (status, json) = get(app.clone(), "/progress").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json,
            serde_json::json!({"status": "error", "message": "No download ID provided"})
        );

        let (status, _) = get(app, "/progress?download_id=").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_id_reports_unknown() {
        let (_, app) = app();
        let (status, json) = get(app, "/progress?download_id=nope").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "unknown");
        assert_eq!(json["progress"], 0.0);
        assert_eq!(json["message"], "Download not found");
    }

    #[tokio::test]
    async fn test_snapshot_fields() {
        let (state, app) = app();
        state.store.update(
            "p1",
            JobUpdate::new(JobStatus::DownloadingMultiple, 36.5, "Downloading: B (40.0%)")
                .items(2, 3, "B")
                .failed(1),
        );

        let (status, json) = get(app, "/progress?download_id=p1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            serde_json::json!({
                "status": "downloading_multiple",
                "progress": 36.5,
                "message": "Downloading: B (40.0%)",
                "current_item": 2,
                "total_items": 3,
                "item_name": "B",
                "failed_items": 1
            })
        );
    }
}
