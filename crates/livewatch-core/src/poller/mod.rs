//! Status poller
//!
//! The poller is the single entry point every reader goes through: the HTTP
//! handlers, the boolean convenience query and the [`Scheduler`](crate::Scheduler).
//!
//! ## Poll Flow
//!
//! 1. Fetch and normalize the status (one outbound call)
//! 2. Reject a LIVE status that lacks a session id or title
//! 3. Feed the state to the [`TransitionDetector`]
//! 4. If LIVE, try the detail endpoint for a thumbnail (failure swallowed)
//! 5. Fill a missing thumbnail from the source's fallback
//! 6. Return the status
//!
//! The state is observed before the detail call, so a slow or hanging detail
//! endpoint never holds back the transition notification.
//!
//! A failed fetch returns [`Error::SourceUnavailable`] and leaves the detector
//! untouched. Nothing is retried; the next poll simply tries again.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{LiveState, LiveStatus};
use crate::traits::StatusSource;
use crate::transition::TransitionDetector;

/// Fetches the current status and drives the immediate notification path
pub struct StatusPoller {
    source: Arc<dyn StatusSource>,
    detector: TransitionDetector,
}

impl StatusPoller {
    /// Create a poller over a source and a detector
    pub fn new(source: Arc<dyn StatusSource>, detector: TransitionDetector) -> Self {
        Self { source, detector }
    }

    /// Poll the source once
    ///
    /// # Returns
    ///
    /// - `Ok(LiveStatus)`: The normalized, thumbnail-enriched status
    /// - `Err(Error::SourceUnavailable)`: The fetch failed; no state was changed
    pub async fn fetch_status(&self) -> Result<LiveStatus> {
        let mut status = self.source.fetch_status().await.map_err(|e| match e {
            Error::SourceUnavailable(_) => e,
            other => Error::source_unavailable(other.to_string()),
        })?;

        status.validate()?;

        self.detector.observe(status.state).await;

        if status.is_live() {
            match self.source.fetch_thumbnail().await {
                Ok(Some(url)) => status.thumbnail_url = Some(url),
                Ok(None) => debug!("Stream detail carried no thumbnail"),
                Err(e) => warn!("Ignoring detail failure from {}: {}", self.source.source_name(), e),
            }
        }

        if status.thumbnail_url.is_none() {
            status.thumbnail_url = self.source.fallback_thumbnail();
        }

        Ok(status)
    }

    /// Poll and collapse any failure into `None`
    ///
    /// This is what read endpoints expose: no error details, just absence.
    pub async fn current(&self) -> Option<LiveStatus> {
        match self.fetch_status().await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!("Status poll failed: {}", e);
                None
            }
        }
    }

    /// Poll and report whether the stream is live; a failed poll reads as offline
    pub async fn is_live(&self) -> bool {
        self.current().await.is_some_and(|status| status.is_live())
    }

    /// The state the detector last observed
    pub fn last_observed(&self) -> LiveState {
        self.detector.current()
    }
}
