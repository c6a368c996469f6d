//! Scheduler (durable notification path)
//!
//! The scheduler polls once per interval and drives the restart-safe
//! "stream started" announcement through the [`SessionRecorder`].
//!
//! ## Tick Flow
//!
//! ```text
//! poll ──► absent / OFFLINE ─────────────────────────────► done
//!   │
//!   └─► LIVE(session) ──► should_notify? ── no ──────────► done
//!                              │
//!                             yes
//!                              ▼
//!          record_session_start (if no row yet)
//!                              ▼
//!          dispatch "start" to live_start (failure swallowed)
//!                              ▼
//!                        mark_notified
//! ```
//!
//! A persistence error abandons the tick without rollback. A session that was
//! recorded but never marked is announced again on the next tick: the durable
//! path is at-least-once.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info, warn};

use crate::config::{NotificationTemplates, SchedulerConfig};
use crate::error::Result;
use crate::poller::StatusPoller;
use crate::recorder::SessionRecorder;
use crate::traits::{PushGateway, PushMessage, TOPIC_LIVE_START, dispatch};

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The poll failed; nothing else happened
    NoStatus,
    /// The stream is not live
    Offline,
    /// Live, but this session was already announced
    AlreadyNotified { session_id: String },
    /// Live, and the durable announcement went out for this session
    Announced { session_id: String },
}

/// Events emitted by the Scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Scheduler started
    Started { interval: Duration },

    /// A tick ran to completion
    TickCompleted { outcome: TickOutcome },

    /// A tick was abandoned
    TickFailed { error: String },

    /// Scheduler stopped
    Stopped { reason: String },
}

/// Periodic poller driving the durable "start" announcement
pub struct Scheduler {
    poller: Arc<StatusPoller>,
    recorder: SessionRecorder,
    gateway: Arc<dyn PushGateway>,
    templates: NotificationTemplates,
    interval: Duration,
    event_tx: mpsc::Sender<SchedulerEvent>,
}

impl Scheduler {
    /// Create a new scheduler
    ///
    /// # Returns
    ///
    /// A tuple of (scheduler, event_receiver) where event_receiver yields scheduler events
    pub fn new(
        poller: Arc<StatusPoller>,
        recorder: SessionRecorder,
        gateway: Arc<dyn PushGateway>,
        templates: NotificationTemplates,
        config: &SchedulerConfig,
    ) -> Result<(Self, mpsc::Receiver<SchedulerEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let scheduler = Self {
            poller,
            recorder,
            gateway,
            templates,
            interval: Duration::from_secs(config.interval_secs),
            event_tx: tx,
        };

        Ok((scheduler, rx))
    }

    /// Override the tick interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run until the given oneshot fires (or its sender is dropped)
    pub async fn run_with_shutdown(&self, mut shutdown_rx: oneshot::Receiver<()>) -> Result<()> {
        self.emit_event(SchedulerEvent::Started {
            interval: self.interval,
        });
        info!("Scheduler started (interval={:?})", self.interval);

        let mut ticks = IntervalStream::new(tokio::time::interval(self.interval));

        loop {
            tokio::select! {
                Some(_) = ticks.next() => {
                    match self.tick().await {
                        Ok(outcome) => {
                            debug!("Tick completed: {:?}", outcome);
                            self.emit_event(SchedulerEvent::TickCompleted { outcome });
                        }
                        Err(e) => {
                            error!("Tick abandoned: {}", e);
                            self.emit_event(SchedulerEvent::TickFailed {
                                error: e.to_string(),
                            });
                        }
                    }
                }

                _ = &mut shutdown_rx => {
                    info!("Shutdown signal received");
                    self.emit_event(SchedulerEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    break;
                }
            }
        }

        Ok(())
    }

    /// Run one tick
    ///
    /// # Returns
    ///
    /// - `Ok(TickOutcome)`: What the tick did
    /// - `Err(Error::Persistence)`: The session store failed; the tick was abandoned
    pub async fn tick(&self) -> Result<TickOutcome> {
        let Some(status) = self.poller.current().await else {
            return Ok(TickOutcome::NoStatus);
        };

        let session_id = match status.session_id.as_deref() {
            Some(id) if status.is_live() && !id.is_empty() => id.to_string(),
            _ => return Ok(TickOutcome::Offline),
        };

        if !self.recorder.should_notify(&session_id).await? {
            return Ok(TickOutcome::AlreadyNotified { session_id });
        }

        if !self.recorder.is_recorded(&session_id).await? {
            self.recorder.record_session_start(&status).await?;
        } else {
            warn!(
                "Session {} recorded but never marked notified, announcing again",
                session_id
            );
        }

        let body = status.title.clone().unwrap_or_default();
        let message =
            PushMessage::to_topic(TOPIC_LIVE_START, self.templates.start_title.as_str(), body);
        dispatch(self.gateway.as_ref(), &message).await;

        self.recorder.mark_notified(&session_id).await?;
        info!("Announced session {}", session_id);

        Ok(TickOutcome::Announced { session_id })
    }

    fn emit_event(&self, event: SchedulerEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("Scheduler event channel full, dropping event");
        }
    }
}
