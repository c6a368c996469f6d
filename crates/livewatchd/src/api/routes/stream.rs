//! Broadcast status and replay routes.
//!
//! Failed polls are never surfaced as errors here: the status reads as `null`,
//! liveness reads as `false`.

use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
};
use livewatch_core::{LiveStatus, ReplayEntry};

use crate::api::AppState;

/// Create the stream router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/live-status", get(live_status))
        .route("/is-live", get(is_live))
        .route("/replays", get(replays))
}

/// Current status, or `null` when the poll failed.
async fn live_status(State(state): State<AppState>) -> impl IntoResponse {
    let status: Option<LiveStatus> = state.poller.current().await;
    (
        [
            (header::CACHE_CONTROL, "no-cache, no-store"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(status),
    )
}

async fn is_live(State(state): State<AppState>) -> Json<bool> {
    Json(state.poller.is_live().await)
}

async fn replays(State(state): State<AppState>) -> Json<Vec<ReplayEntry>> {
    Json(state.replays.list_replays().await)
}
