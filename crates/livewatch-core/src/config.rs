//! Configuration types for livewatch
//!
//! This module defines all configuration structures used throughout the workspace.

use serde::{Deserialize, Serialize};

/// Main livewatch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LivewatchConfig {
    /// External status source configuration
    pub source: SourceConfig,

    /// Push gateway configuration
    pub push: PushConfig,

    /// Session store configuration
    #[serde(default)]
    pub session_store: SessionStoreConfig,

    /// Scheduler settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Notification texts
    #[serde(default)]
    pub notifications: NotificationTemplates,
}

impl LivewatchConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.source.validate()?;
        self.push.validate()?;
        self.session_store.validate()?;
        self.scheduler.validate()?;
        self.notifications.validate()?;
        Ok(())
    }
}

/// External status source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Chzzk live-status API
    Chzzk {
        /// Channel identifier used to build every request URL
        channel_id: String,
        /// API base URL (defaults to the public endpoint)
        #[serde(default)]
        api_base: Option<String>,
        /// Request timeout in seconds
        #[serde(default = "default_source_timeout_secs")]
        timeout_secs: u64,
    },
}

impl SourceConfig {
    /// Validate the source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            SourceConfig::Chzzk {
                channel_id,
                api_base,
                timeout_secs,
            } => {
                if channel_id.trim().is_empty() {
                    return Err(crate::Error::config("Channel id cannot be empty"));
                }
                if let Some(base) = api_base
                    && !base.starts_with("https://")
                    && !base.starts_with("http://")
                {
                    return Err(crate::Error::config(format!(
                        "API base must use HTTP or HTTPS scheme. Got: {}",
                        base
                    )));
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("Source timeout must be > 0"));
                }
                Ok(())
            }
        }
    }

    /// The configured channel id
    pub fn channel_id(&self) -> &str {
        match self {
            SourceConfig::Chzzk { channel_id, .. } => channel_id,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Chzzk {
            channel_id: String::new(),
            api_base: None,
            timeout_secs: default_source_timeout_secs(),
        }
    }
}

/// Push gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushConfig {
    /// Firebase Cloud Messaging
    Fcm {
        /// Path to the service-account JSON key
        credentials_path: Option<String>,
        /// Log messages instead of sending them
        #[serde(default)]
        dry_run: bool,
    },
}

impl PushConfig {
    /// Validate the push configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            PushConfig::Fcm {
                credentials_path,
                dry_run,
            } => {
                if !dry_run && credentials_path.as_deref().is_none_or(str::is_empty) {
                    return Err(crate::Error::config(
                        "FCM credentials path is required unless running in dry-run mode",
                    ));
                }
                Ok(())
            }
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        PushConfig::Fcm {
            credentials_path: None,
            dry_run: true,
        }
    }
}

/// Session store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionStoreConfig {
    /// File-based session store
    File {
        /// Path to the session file
        path: String,
    },

    /// In-memory session store (not durable)
    #[default]
    Memory,
}

impl SessionStoreConfig {
    /// Validate the session store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            SessionStoreConfig::File { path } if path.is_empty() => Err(crate::Error::config(
                "Session store path cannot be empty for a file store",
            )),
            _ => Ok(()),
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between scheduled polls
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Capacity of the scheduler event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl SchedulerConfig {
    /// Validate the scheduler configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Scheduler interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

/// Titles and bodies of the stream notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTemplates {
    /// Title of every "stream started" notification
    #[serde(default = "default_start_title")]
    pub start_title: String,

    /// Body of the immediate "stream started" notification
    #[serde(default = "default_start_body")]
    pub start_body: String,

    /// Title of the "stream ended" notification
    #[serde(default = "default_end_title")]
    pub end_title: String,

    /// Body of the "stream ended" notification
    #[serde(default = "default_end_body")]
    pub end_body: String,
}

impl NotificationTemplates {
    /// Validate the templates
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.start_title.is_empty() || self.end_title.is_empty() {
            return Err(crate::Error::config("Notification titles cannot be empty"));
        }
        Ok(())
    }
}

impl Default for NotificationTemplates {
    fn default() -> Self {
        Self {
            start_title: default_start_title(),
            start_body: default_start_body(),
            end_title: default_end_title(),
            end_body: default_end_body(),
        }
    }
}

fn default_source_timeout_secs() -> u64 {
    10
}

fn default_interval_secs() -> u64 {
    60
}

fn default_event_channel_capacity() -> usize {
    100
}

fn default_start_title() -> String {
    "Stream started!".to_string()
}

fn default_start_body() -> String {
    "We are live now".to_string()
}

fn default_end_title() -> String {
    "Stream ended".to_string()
}

fn default_end_body() -> String {
    "Thanks for watching today!".to_string()
}
