//! Session recorder (durable notification bookkeeping)
//!
//! The restart-safe counterpart of the [`TransitionDetector`](crate::TransitionDetector).
//! The [`Scheduler`](crate::Scheduler) uses it in a fixed order:
//!
//! 1. [`should_notify`](SessionRecorder::should_notify)
//! 2. [`record_session_start`](SessionRecorder::record_session_start) (only when 1 said yes
//!    and no row exists yet)
//! 3. dispatch
//! 4. [`mark_notified`](SessionRecorder::mark_notified)
//!
//! The store does not deduplicate inserts on its own; inserting an id twice
//! is a caller error and surfaces as [`Error::Persistence`].

use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{LiveStatus, Session};
use crate::traits::SessionStore;

/// Restart-safe "start" bookkeeping over a [`SessionStore`]
#[derive(Clone)]
pub struct SessionRecorder {
    store: Arc<dyn SessionStore>,
}

impl SessionRecorder {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// True iff no session row exists for `session_id`, or its notification is not yet sent
    pub async fn should_notify(&self, session_id: &str) -> Result<bool> {
        let session = self.store.get_session(session_id).await?;
        Ok(session.is_none_or(|s| !s.notification_sent))
    }

    /// Whether a row already exists for `session_id`
    pub async fn is_recorded(&self, session_id: &str) -> Result<bool> {
        Ok(self.store.get_session(session_id).await?.is_some())
    }

    /// Insert a new, not-yet-notified session row for a live status
    pub async fn record_session_start(&self, status: &LiveStatus) -> Result<()> {
        let (Some(session_id), Some(title)) = (&status.session_id, &status.title) else {
            return Err(Error::invalid_input(
                "cannot record a session without session id and title",
            ));
        };

        let session = Session::started(session_id.as_str(), title.as_str());
        self.store.insert_session(&session).await?;
        debug!("Recorded start of session {}", session_id);
        Ok(())
    }

    /// Flip `notification_sent` to true for `session_id`
    pub async fn mark_notified(&self, session_id: &str) -> Result<()> {
        self.store.mark_notified(session_id).await?;
        debug!("Session {} marked as notified", session_id);
        Ok(())
    }
}
