//! Health check route.

use axum::{Json, Router, routing::get};
use chrono::Utc;
use serde::Serialize;

use crate::api::AppState;

/// Create the health router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Unix epoch milliseconds, as a string
    pub timestamp: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP",
        timestamp: Utc::now().timestamp_millis().to_string(),
    })
}
