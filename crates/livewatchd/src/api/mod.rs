//! HTTP surface
//!
//! A thin mapping from routes to core operations. Status reads go through the
//! [`StatusPoller`], so every request is a poll and may trigger the immediate
//! notification path.

pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::Request;
use livewatch_core::{DeviceTokenStore, ReplayCatalog, ScheduleCatalog, StatusPoller};
use tower_http::trace::TraceLayer;
use tracing::Span;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub poller: Arc<StatusPoller>,
    pub replays: Arc<dyn ReplayCatalog>,
    pub schedules: Arc<dyn ScheduleCatalog>,
    pub tokens: Arc<dyn DeviceTokenStore>,
}

/// Build the router with all routes and request tracing
///
/// Health probes are not traced.
pub fn build_router(state: AppState) -> Router {
    routes::create_router(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &Request| {
                if req.uri().path().starts_with("/api/health") {
                    Span::none()
                } else {
                    let mut make_span =
                        tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO);
                    use tower_http::trace::MakeSpan;
                    make_span.make_span(req)
                }
            })
            .on_response(
                |res: &axum::http::Response<_>, latency: Duration, span: &Span| {
                    if span.is_disabled() {
                        return;
                    }
                    let on_response =
                        tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO);
                    use tower_http::trace::OnResponse;
                    on_response.on_response(res, latency, span);
                },
            ),
    )
}
