//! Upcoming broadcast schedule.

use axum::{Json, Router, extract::State, routing::get};
use livewatch_core::ScheduleEntry;

use crate::api::AppState;
use crate::api::error::ApiResult;

/// Create the schedules router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_schedules))
}

async fn list_schedules(State(state): State<AppState>) -> ApiResult<Json<Vec<ScheduleEntry>>> {
    let schedules = state.schedules.list_schedules().await?;
    Ok(Json(schedules))
}
