//! API route modules.

pub mod health;
pub mod notifications;
pub mod schedules;
pub mod stream;

use axum::Router;

use crate::api::AppState;

/// Create the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/stream", stream::router())
        .nest("/api/schedules", schedules::router())
        .nest("/api/notifications", notifications::router())
        .nest("/api/health", health::router())
        .with_state(state)
}
