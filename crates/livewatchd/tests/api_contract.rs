//! Contract Test: HTTP Surface
//!
//! Drives the daemon router in-process with scripted collaborators.
//!
//! Constraints verified:
//! - Status reads never surface poll errors (null / false, always 200)
//! - Status responses are not cacheable
//! - A status read is a poll: an observed transition notifies once
//! - Schedule failures are a 500 with a JSON error body
//! - Token registration ignores missing or empty tokens

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use livewatch_core::traits::{DeliveryReceipt, PushGateway, PushMessage, StatusSource};
use livewatch_core::{
    DeviceTokenStore, EmptyScheduleCatalog, Error, LiveStatus, MemoryTokenStore,
    NotificationTemplates, ReplayCatalog, ReplayEntry, ScheduleCatalog, ScheduleEntry,
    StatusPoller, TransitionCell, TransitionDetector,
};
use livewatchd::api::{AppState, build_router};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Returns whatever status is currently set; `None` fails the fetch
struct FixedSource {
    status: Mutex<Option<LiveStatus>>,
}

impl FixedSource {
    fn new(status: Option<LiveStatus>) -> Self {
        Self {
            status: Mutex::new(status),
        }
    }

    fn set(&self, status: Option<LiveStatus>) {
        *self.status.lock().unwrap() = status;
    }
}

#[async_trait]
impl StatusSource for FixedSource {
    async fn fetch_status(&self) -> Result<LiveStatus, Error> {
        self.status
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::source_unavailable("connection refused"))
    }

    async fn fetch_thumbnail(&self) -> Result<Option<String>, Error> {
        Ok(Some("https://img.example/live.jpg".to_string()))
    }

    fn source_name(&self) -> &'static str {
        "fixed"
    }
}

#[derive(Default)]
struct CollectingGateway {
    sent: Mutex<Vec<PushMessage>>,
}

#[async_trait]
impl PushGateway for CollectingGateway {
    async fn send(&self, message: &PushMessage) -> Result<DeliveryReceipt, Error> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(DeliveryReceipt {
            message_id: "m-1".to_string(),
        })
    }

    fn gateway_name(&self) -> &'static str {
        "collecting"
    }
}

struct StaticReplays(Vec<ReplayEntry>);

#[async_trait]
impl ReplayCatalog for StaticReplays {
    async fn list_replays(&self) -> Vec<ReplayEntry> {
        self.0.clone()
    }
}

struct BrokenSchedules;

#[async_trait]
impl ScheduleCatalog for BrokenSchedules {
    async fn list_schedules(&self) -> Result<Vec<ScheduleEntry>, Error> {
        Err(Error::persistence("schedule file is garbage"))
    }
}

struct Harness {
    source: Arc<FixedSource>,
    gateway: Arc<CollectingGateway>,
    tokens: Arc<MemoryTokenStore>,
    state: AppState,
}

fn harness(status: Option<LiveStatus>) -> Harness {
    let source = Arc::new(FixedSource::new(status));
    let gateway = Arc::new(CollectingGateway::default());
    let tokens = Arc::new(MemoryTokenStore::new());

    let detector = TransitionDetector::new(
        Arc::new(TransitionCell::new()),
        gateway.clone(),
        NotificationTemplates::default(),
    );
    let poller = Arc::new(StatusPoller::new(source.clone(), detector));

    let state = AppState {
        poller,
        replays: Arc::new(StaticReplays(vec![ReplayEntry {
            clip_id: "v1".to_string(),
            title: "Yesterday".to_string(),
            video_url: "https://chzzk.naver.com/video/1001".to_string(),
            thumbnail_url: None,
            view_count: 42,
            created_at: Some("2024-05-01 20:00:00".to_string()),
        }])),
        schedules: Arc::new(EmptyScheduleCatalog),
        tokens: tokens.clone(),
    };

    Harness {
        source,
        gateway,
        tokens,
        state,
    }
}

fn live() -> LiveStatus {
    LiveStatus::live("abc", "Hello").with_channel_id("channel-1")
}

async fn get(state: &AppState, uri: &str) -> Response {
    build_router(state.clone())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_json(state: &AppState, uri: &str, body: Value) -> Response {
    build_router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn live_status_is_uncacheable_json() {
    let h = harness(Some(live()));

    let response = get(&h.state, "/api/stream/live-status").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-cache, no-store"
    );
    assert_eq!(response.headers().get(header::PRAGMA).unwrap(), "no-cache");

    let body = body_json(response).await;
    assert_eq!(body["sessionId"], "abc");
    assert_eq!(body["title"], "Hello");
    assert_eq!(body["state"], "LIVE");
    assert_eq!(body["thumbnailUrl"], "https://img.example/live.jpg");
    assert_eq!(body["channelId"], "channel-1");
}

#[tokio::test]
async fn failed_poll_reads_as_null() {
    let h = harness(None);

    let response = get(&h.state, "/api/stream/live-status").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"null");
}

#[tokio::test]
async fn status_reads_drive_the_immediate_notification() {
    let h = harness(Some(live()));

    for _ in 0..3 {
        get(&h.state, "/api/stream/live-status").await;
    }
    {
        let sent = h.gateway.sent.lock().unwrap();
        assert_eq!(sent.len(), 1, "One start for repeated LIVE reads");
        assert_eq!(sent[0].topic(), Some("live_start"));
    }

    h.source.set(Some(LiveStatus::offline()));
    get(&h.state, "/api/stream/is-live").await;

    let sent = h.gateway.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].topic(), Some("live_end"));
}

#[tokio::test]
async fn is_live_reports_a_bare_boolean() {
    let h = harness(Some(live()));
    let response = get(&h.state, "/api/stream/is-live").await;
    assert_eq!(body_json(response).await, json!(true));

    h.source.set(None);
    let response = get(&h.state, "/api/stream/is-live").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!(false));
}

#[tokio::test]
async fn replays_pass_through() {
    let h = harness(None);

    let body = body_json(get(&h.state, "/api/stream/replays").await).await;
    assert_eq!(body[0]["clipId"], "v1");
    assert_eq!(body[0]["videoUrl"], "https://chzzk.naver.com/video/1001");
    assert_eq!(body[0]["viewCount"], 42);
}

#[tokio::test]
async fn schedules_list_and_fail_as_json() {
    let h = harness(None);
    let response = get(&h.state, "/api/schedules").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));

    let mut state = h.state.clone();
    state.schedules = Arc::new(BrokenSchedules);
    let response = get(&state, "/api/schedules").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["code"], "INTERNAL_ERROR");
    assert!(!body["message"].as_str().unwrap().contains("garbage"));
}

#[tokio::test]
async fn register_stores_token_with_empty_body() {
    let h = harness(None);

    let response = post_json(&h.state, "/api/notifications/register", json!({ "token": "device-1" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());

    let response = post_json(&h.state, "/api/notifications/register", json!({ "token": "" })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(&h.state, "/api/notifications/register", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(h.tokens.list_tokens().await.unwrap(), vec!["device-1".to_string()]);
}

#[tokio::test]
async fn token_endpoint_confirms_and_deduplicates() {
    let h = harness(None);

    for _ in 0..2 {
        let response =
            post_json(&h.state, "/api/notifications/token", json!({ "fcmToken": "device-2" })).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "status": "success", "message": "token saved" })
        );
    }

    let response = post_json(&h.state, "/api/notifications/token", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(h.tokens.list_tokens().await.unwrap(), vec!["device-2".to_string()]);
}

#[tokio::test]
async fn health_reports_up_with_millis_timestamp() {
    let h = harness(None);

    let body = body_json(get(&h.state, "/api/health").await).await;
    assert_eq!(body["status"], "UP");

    let millis: i64 = body["timestamp"].as_str().unwrap().parse().unwrap();
    assert!(millis > 1_600_000_000_000);
}
