//! Transition detection (immediate notification path)
//!
//! The [`TransitionCell`] owns the last observed [`LiveState`]. Comparing the
//! new state against it and storing the new state is one atomic swap, so when
//! several pollers observe the same real transition concurrently exactly one
//! of them gets the transition back, and only that caller dispatches.
//!
//! ```text
//!   observe(new) ──► cell.swap(new) ──► previous
//!                                          │
//!              previous == new ────────────┼──► nothing
//!              OFFLINE → LIVE ─────────────┼──► live_start
//!              LIVE → OFFLINE ─────────────┴──► live_end
//! ```
//!
//! The cell starts OFFLINE and lives only as long as the process. A stream that
//! is already live at the first poll after a restart is announced again here;
//! restart-safe bookkeeping is the job of [`SessionRecorder`](crate::SessionRecorder).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::config::NotificationTemplates;
use crate::model::LiveState;
use crate::traits::{PushGateway, PushMessage, TOPIC_LIVE_END, TOPIC_LIVE_START, dispatch};

/// A detected change between two consecutive observations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// OFFLINE → LIVE
    Started,
    /// LIVE → OFFLINE
    Ended,
}

impl Transition {
    /// Topic the transition is announced on
    pub fn topic(self) -> &'static str {
        match self {
            Transition::Started => TOPIC_LIVE_START,
            Transition::Ended => TOPIC_LIVE_END,
        }
    }
}

/// Single-writer cell holding the last observed state
#[derive(Debug, Default)]
pub struct TransitionCell {
    live: AtomicBool,
}

impl TransitionCell {
    /// A cell in the initial OFFLINE state
    pub fn new() -> Self {
        Self::default()
    }

    /// The last observed state
    pub fn current(&self) -> LiveState {
        if self.live.load(Ordering::Acquire) {
            LiveState::Live
        } else {
            LiveState::Offline
        }
    }

    /// Record `new` and report the transition it completes, if any
    ///
    /// Compare and update happen in one atomic swap. Of any number of
    /// concurrent callers moving the cell across the same edge, exactly one
    /// receives `Some`.
    pub fn advance(&self, new: LiveState) -> Option<Transition> {
        let was_live = self.live.swap(new.is_live(), Ordering::AcqRel);
        match (was_live, new) {
            (false, LiveState::Live) => Some(Transition::Started),
            (true, LiveState::Offline) => Some(Transition::Ended),
            _ => None,
        }
    }
}

/// Detects transitions and announces them on the immediate path
pub struct TransitionDetector {
    cell: Arc<TransitionCell>,
    gateway: Arc<dyn PushGateway>,
    templates: NotificationTemplates,
}

impl TransitionDetector {
    /// Create a detector over an injected cell
    pub fn new(
        cell: Arc<TransitionCell>,
        gateway: Arc<dyn PushGateway>,
        templates: NotificationTemplates,
    ) -> Self {
        Self {
            cell,
            gateway,
            templates,
        }
    }

    /// The last observed state
    pub fn current(&self) -> LiveState {
        self.cell.current()
    }

    /// Observe a freshly fetched state
    ///
    /// Dispatch happens after the swap commits and only for the caller that
    /// won it. Delivery failures are logged and discarded; they never reach
    /// the caller and never undo the swap.
    ///
    /// The send runs on its own task. The winner waits for it, but dropping
    /// the winner mid-send detaches the task instead of cancelling it, so a
    /// committed transition is always dispatched.
    pub async fn observe(&self, new: LiveState) -> Option<Transition> {
        let transition = self.cell.advance(new)?;
        info!("Broadcast state changed: now {}", new);

        let message = self.message_for(transition);
        let gateway = Arc::clone(&self.gateway);
        let send = tokio::spawn(async move {
            dispatch(gateway.as_ref(), &message).await;
        });

        if let Err(e) = send.await {
            warn!("{} dispatch task failed: {}", transition.topic(), e);
        }

        Some(transition)
    }

    fn message_for(&self, transition: Transition) -> PushMessage {
        let (title, body) = match transition {
            Transition::Started => (&self.templates.start_title, &self.templates.start_body),
            Transition::Ended => (&self.templates.end_title, &self.templates.end_body),
        };

        PushMessage::to_topic(transition.topic(), title.as_str(), body.as_str())
            .with_kind(transition.topic())
    }
}
