//! Device token registration routes.
//!
//! Both routes accept a missing or empty token and simply do nothing with it.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::api::error::ApiResult;

/// Create the notifications router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/token", post(save_token))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTokenRequest {
    #[serde(default)]
    pub fcm_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveTokenResponse {
    pub status: &'static str,
    pub message: &'static str,
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<StatusCode> {
    store_token(&state, request.token.as_deref()).await?;
    Ok(StatusCode::OK)
}

async fn save_token(
    State(state): State<AppState>,
    Json(request): Json<SaveTokenRequest>,
) -> ApiResult<Json<SaveTokenResponse>> {
    store_token(&state, request.fcm_token.as_deref()).await?;
    Ok(Json(SaveTokenResponse {
        status: "success",
        message: "token saved",
    }))
}

async fn store_token(state: &AppState, token: Option<&str>) -> ApiResult<()> {
    match token.filter(|t| !t.is_empty()) {
        Some(token) => {
            state.tokens.register_token(token).await?;
            tracing::debug!("Registered device token");
        }
        None => tracing::debug!("Ignoring registration without a token"),
    }
    Ok(())
}
