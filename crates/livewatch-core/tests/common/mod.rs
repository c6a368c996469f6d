//! Test doubles and common utilities for contract tests
//!
//! The doubles here are scripted stand-ins for the external collaborators:
//! they record what the core asked of them and fail on demand.

#![allow(dead_code)]

use livewatch_core::error::Result;
use livewatch_core::scheduler::SchedulerEvent;
use livewatch_core::traits::{DeliveryReceipt, PushGateway, PushMessage, SessionStore, StatusSource};
use livewatch_core::{
    Error, LiveStatus, MemorySessionStore, NotificationTemplates, Scheduler, SchedulerConfig,
    Session, SessionRecorder, StatusPoller, TransitionCell, TransitionDetector,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// One scripted answer of the status source
#[derive(Debug, Clone)]
pub enum Step {
    /// Return this status
    Status(LiveStatus),
    /// Fail the way an unreachable source does
    Unavailable,
    /// Fail with an error the source did not classify
    Unclassified,
}

/// One scripted answer of the detail endpoint
#[derive(Debug, Clone)]
pub enum Thumbnail {
    Url(String),
    Missing,
    Fail,
}

/// A StatusSource that replays a script
///
/// Steps are consumed in order; the last step repeats forever.
pub struct ScriptedStatusSource {
    script: Mutex<VecDeque<Step>>,
    thumbnail: Mutex<Thumbnail>,
    fallback: Option<String>,
    delay: Option<Duration>,
    thumbnail_delay: Option<Duration>,
    fetch_count: AtomicUsize,
    thumbnail_count: AtomicUsize,
}

impl ScriptedStatusSource {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        let script: VecDeque<Step> = steps.into_iter().collect();
        assert!(!script.is_empty(), "script needs at least one step");

        Self {
            script: Mutex::new(script),
            thumbnail: Mutex::new(Thumbnail::Missing),
            fallback: None,
            delay: None,
            thumbnail_delay: None,
            fetch_count: AtomicUsize::new(0),
            thumbnail_count: AtomicUsize::new(0),
        }
    }

    /// A source that always answers with the same status
    pub fn always(status: LiveStatus) -> Self {
        Self::new([Step::Status(status)])
    }

    pub fn with_thumbnail(self, thumbnail: Thumbnail) -> Self {
        *self.thumbnail.lock().unwrap() = thumbnail;
        self
    }

    pub fn with_fallback(mut self, url: impl Into<String>) -> Self {
        self.fallback = Some(url.into());
        self
    }

    /// Delay every status fetch (widens concurrency windows)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay every detail fetch
    pub fn with_thumbnail_delay(mut self, delay: Duration) -> Self {
        self.thumbnail_delay = Some(delay);
        self
    }

    /// Replace the remaining script
    pub fn script(&self, steps: impl IntoIterator<Item = Step>) {
        let mut script = self.script.lock().unwrap();
        *script = steps.into_iter().collect();
        assert!(!script.is_empty(), "script needs at least one step");
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn thumbnail_count(&self) -> usize {
        self.thumbnail_count.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Step {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        }
    }
}

#[async_trait::async_trait]
impl StatusSource for ScriptedStatusSource {
    async fn fetch_status(&self) -> Result<LiveStatus> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.next_step() {
            Step::Status(status) => Ok(status),
            Step::Unavailable => Err(Error::source_unavailable("scripted outage")),
            Step::Unclassified => Err(Error::Other("scripted surprise".to_string())),
        }
    }

    async fn fetch_thumbnail(&self) -> Result<Option<String>> {
        self.thumbnail_count.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.thumbnail_delay {
            tokio::time::sleep(delay).await;
        }

        let thumbnail = self.thumbnail.lock().unwrap().clone();
        match thumbnail {
            Thumbnail::Url(url) => Ok(Some(url)),
            Thumbnail::Missing => Ok(None),
            Thumbnail::Fail => Err(Error::detail_unavailable("scripted detail outage")),
        }
    }

    fn fallback_thumbnail(&self) -> Option<String> {
        self.fallback.clone()
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A PushGateway that records every attempted message
#[derive(Default)]
pub struct RecordingPushGateway {
    attempts: Mutex<Vec<PushMessage>>,
    failing: AtomicBool,
    send_delay: Option<Duration>,
    delivered: AtomicUsize,
}

impl RecordingPushGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway that rejects every message
    pub fn failing() -> Self {
        let gateway = Self::default();
        gateway.set_failing(true);
        gateway
    }

    /// Take `delay` to answer every send
    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = Some(delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every message handed to the gateway, accepted or not
    pub fn attempts(&self) -> Vec<PushMessage> {
        self.attempts.lock().unwrap().clone()
    }

    /// Sends that ran to completion and were accepted
    pub fn delivered_count(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    pub fn count_for_topic(&self, topic: &str) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.topic() == Some(topic))
            .count()
    }
}

#[async_trait::async_trait]
impl PushGateway for RecordingPushGateway {
    async fn send(&self, message: &PushMessage) -> Result<DeliveryReceipt> {
        let message_id = {
            let mut attempts = self.attempts.lock().unwrap();
            attempts.push(message.clone());
            format!("recorded-{}", attempts.len())
        };

        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::delivery_failed("recording", "scripted rejection"));
        }

        self.delivered.fetch_add(1, Ordering::SeqCst);
        Ok(DeliveryReceipt { message_id })
    }

    fn gateway_name(&self) -> &'static str {
        "recording"
    }
}

/// A SessionStore whose operations can be made to fail one by one
#[derive(Default)]
pub struct FlakySessionStore {
    inner: MemorySessionStore,
    fail_reads: AtomicBool,
    fail_inserts: AtomicBool,
    fail_marks: AtomicBool,
    insert_count: AtomicUsize,
}

impl FlakySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_marks(&self, fail: bool) {
        self.fail_marks.store(fail, Ordering::SeqCst);
    }

    pub fn insert_count(&self) -> usize {
        self.insert_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SessionStore for FlakySessionStore {
    async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::persistence("scripted read failure"));
        }
        self.inner.get_session(session_id).await
    }

    async fn insert_session(&self, session: &Session) -> Result<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(Error::persistence("scripted insert failure"));
        }
        self.insert_count.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_session(session).await
    }

    async fn mark_notified(&self, session_id: &str) -> Result<()> {
        if self.fail_marks.load(Ordering::SeqCst) {
            return Err(Error::persistence("scripted mark failure"));
        }
        self.inner.mark_notified(session_id).await
    }
}

/// A poller over the given doubles with a fresh, OFFLINE transition cell
pub fn poller(
    source: &Arc<ScriptedStatusSource>,
    gateway: &Arc<RecordingPushGateway>,
) -> Arc<StatusPoller> {
    let detector = TransitionDetector::new(
        Arc::new(TransitionCell::new()),
        gateway.clone(),
        NotificationTemplates::default(),
    );
    Arc::new(StatusPoller::new(source.clone(), detector))
}

/// A scheduler over the given doubles, ticking every `interval`
pub fn scheduler(
    poller: Arc<StatusPoller>,
    store: Arc<dyn SessionStore>,
    gateway: &Arc<RecordingPushGateway>,
    interval: Duration,
) -> (Scheduler, mpsc::Receiver<SchedulerEvent>) {
    let (scheduler, events) = Scheduler::new(
        poller,
        SessionRecorder::new(store),
        gateway.clone(),
        NotificationTemplates::default(),
        &SchedulerConfig::default(),
    )
    .expect("scheduler construction succeeds");

    (scheduler.with_interval(interval), events)
}

/// A live status the way the source reports it
pub fn live(session_id: &str, title: &str) -> Step {
    Step::Status(LiveStatus::live(session_id, title).with_channel_id("channel-1"))
}

/// An offline status the way the source reports it
pub fn offline() -> Step {
    Step::Status(LiveStatus::offline().with_channel_id("channel-1"))
}
