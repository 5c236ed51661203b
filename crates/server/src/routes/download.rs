// crates/server/src/routes/download.rs
//! Download submission endpoint.
//!
//! - POST /download - validate a submission and start its job

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use reelgrab_core::{validate_custom_path, MediaFormat};

use crate::error::{ApiError, ApiResult};
use crate::jobs::DownloadRequest;
use crate::metrics::RequestTimer;
use crate::state::AppState;

/// Body of `POST /download`.
#[derive(Debug, Default, Deserialize)]
pub struct DownloadBody {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub download_id: Option<String>,
    #[serde(default)]
    pub custom_path: Option<String>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct DownloadStarted {
    pub status: String,
    pub download_id: String,
}

/// Treat blank strings the same as a missing field.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Turn a raw submission into a validated request.
///
/// Nothing is written to the store until this succeeds.
pub fn validate(body: DownloadBody, default_dir: &std::path::Path) -> ApiResult<DownloadRequest> {
    let url = non_blank(body.url).ok_or_else(|| ApiError::BadRequest("No URL provided".into()))?;

    let format = match non_blank(body.format) {
        Some(raw) => raw
            .parse::<MediaFormat>()
            .map_err(|err| ApiError::BadRequest(format!("Invalid format: {err}")))?,
        None => MediaFormat::default(),
    };

    let target_dir: PathBuf = match non_blank(body.custom_path) {
        Some(raw) => validate_custom_path(&raw)?,
        None => default_dir.to_path_buf(),
    };

    let id = non_blank(body.download_id).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    Ok(DownloadRequest {
        id,
        url,
        format,
        target_dir,
    })
}

/// POST /download - start a download job.
pub async fn start_download(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DownloadBody>, JsonRejection>,
) -> ApiResult<Json<DownloadStarted>> {
    let timer = RequestTimer::new("download");

    let result = payload
        .map_err(|rejection| {
            ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
        })
        .and_then(|Json(body)| validate(body, state.default_dir()))
        .and_then(|request| {
            let download_id = request.id.clone();
            state.runner.submit(request)?;
            Ok(download_id)
        });

    match result {
        Ok(download_id) => {
            timer.finish(200);
            Ok(Json(DownloadStarted {
                status: "started".to_string(),
                download_id,
            }))
        }
        Err(err) => {
            timer.finish(err.status_code().as_u16());
            Err(err)
        }
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/download", post(start_download))
}
