//! Normalized status and session types
//!
//! [`LiveStatus`] is rebuilt on every poll and never persisted.
//! [`Session`] is the durable record behind the restart-safe notification path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Broadcast state as seen by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LiveState {
    Live,
    #[default]
    Offline,
}

impl LiveState {
    pub fn is_live(self) -> bool {
        matches!(self, LiveState::Live)
    }
}

impl std::fmt::Display for LiveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiveState::Live => f.write_str("LIVE"),
            LiveState::Offline => f.write_str("OFFLINE"),
        }
    }
}

/// Current broadcast status, normalized from the external source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStatus {
    /// Opaque session id issued by the source (present when live)
    pub session_id: Option<String>,
    /// Stream title (present when live)
    pub title: Option<String>,
    pub state: LiveState,
    pub viewer_count: u64,
    pub opened_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
    /// Channel the status belongs to
    pub channel_id: Option<String>,
}

impl LiveStatus {
    /// An offline status with no stream metadata
    pub fn offline() -> Self {
        Self {
            session_id: None,
            title: None,
            state: LiveState::Offline,
            viewer_count: 0,
            opened_at: None,
            thumbnail_url: None,
            channel_id: None,
        }
    }

    /// A live status for the given session
    pub fn live(session_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            title: Some(title.into()),
            state: LiveState::Live,
            ..Self::offline()
        }
    }

    pub fn with_viewer_count(mut self, viewer_count: u64) -> Self {
        self.viewer_count = viewer_count;
        self
    }

    pub fn with_channel_id(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    pub fn is_live(&self) -> bool {
        self.state.is_live()
    }

    /// Check the LIVE invariant: a live status carries a non-empty session id and title
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.is_live() {
            return Ok(());
        }

        if self.session_id.as_deref().is_none_or(str::is_empty) {
            return Err(crate::Error::source_unavailable(
                "malformed response: live status without session id",
            ));
        }

        if self.title.as_deref().is_none_or(str::is_empty) {
            return Err(crate::Error::source_unavailable(
                "malformed response: live status without title",
            ));
        }

        Ok(())
    }
}

/// Durable record of one live-broadcast session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique key
    pub session_id: String,
    pub title: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Flips false → true exactly once
    pub notification_sent: bool,
}

impl Session {
    /// A freshly observed session, not yet announced
    pub fn started(session_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            title: title.into(),
            started_at: Utc::now(),
            ended_at: None,
            notification_sent: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_without_session_id_is_malformed() {
        let mut status = LiveStatus::live("abc", "Hello");
        status.session_id = Some(String::new());
        assert!(status.validate().unwrap_err().is_source_unavailable());

        status.session_id = None;
        assert!(status.validate().is_err());
    }

    #[test]
    fn live_without_title_is_malformed() {
        let mut status = LiveStatus::live("abc", "Hello");
        status.title = None;
        assert!(status.validate().is_err());
    }

    #[test]
    fn offline_needs_no_metadata() {
        assert!(LiveStatus::offline().validate().is_ok());
    }

    #[test]
    fn status_serializes_camel_case() {
        let status = LiveStatus::live("abc", "Hello")
            .with_viewer_count(42)
            .with_channel_id("chan");
        let json = serde_json::to_value(&status).unwrap();

        assert_eq!(json["sessionId"], "abc");
        assert_eq!(json["state"], "LIVE");
        assert_eq!(json["viewerCount"], 42);
        assert_eq!(json["channelId"], "chan");
        assert!(json["thumbnailUrl"].is_null());
    }
}
