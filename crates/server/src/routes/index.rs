// crates/server/src/routes/index.rs
//! The interactive submission page.

use std::sync::Arc;

use axum::{extract::State, response::Html, routing::get, Router};

use crate::metrics::RequestTimer;
use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// GET / - serve the page and sweep expired job records.
pub async fn index(State(state): State<Arc<AppState>>) -> Html<&'static str> {
    let timer = RequestTimer::new("index");
    state.evict_expired();
    timer.finish(200);
    Html(INDEX_HTML)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(index))
}
