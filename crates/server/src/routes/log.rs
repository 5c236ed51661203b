// crates/server/src/routes/log.rs
//! Browser console relay.

use std::sync::Arc;

use axum::{http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ClientLog {
    #[serde(default)]
    pub message: String,
}

/// POST /log - record a message from the page's console.
pub async fn client_log(Json(entry): Json<ClientLog>) -> StatusCode {
    tracing::info!(target: "reelgrab_server::client", message = %entry.message, "browser log");
    StatusCode::NO_CONTENT
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/log", post(client_log))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::testing::ScriptedFetcher;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_log_returns_no_content() {
        let state = AppState::for_tests(
            Arc::new(ScriptedFetcher::single("Clip")),
            std::path::Path::new("./unused"),
        );
        let app = router().with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/log")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"message":"poll failed"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
