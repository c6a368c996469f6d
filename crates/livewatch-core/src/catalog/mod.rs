//! Read-only catalogs and the device token registry
//!
//! These sit beside the notification pipeline: the HTTP surface passes them
//! through, the core's correctness does not depend on them.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::Error;

/// A planned broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: i64,
    pub title: String,
    pub scheduled_start_time: DateTime<FixedOffset>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_cancelled: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<FixedOffset>>,
}

/// A past broadcast available for replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayEntry {
    pub clip_id: String,
    pub title: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub view_count: u64,
    /// Publish date exactly as the source reported it
    pub created_at: Option<String>,
}

/// Source of upcoming broadcasts
#[async_trait]
pub trait ScheduleCatalog: Send + Sync {
    async fn list_schedules(&self) -> Result<Vec<ScheduleEntry>, Error>;
}

/// Source of past broadcasts
///
/// Implementations return an empty list rather than an error when the
/// upstream is unreachable.
#[async_trait]
pub trait ReplayCatalog: Send + Sync {
    async fn list_replays(&self) -> Vec<ReplayEntry>;
}

/// Registry of push-delivery device tokens
#[async_trait]
pub trait DeviceTokenStore: Send + Sync {
    /// Register a token; registering a known token is a no-op
    async fn register_token(&self, token: &str) -> Result<(), Error>;

    /// All registered tokens
    async fn list_tokens(&self) -> Result<Vec<String>, Error>;
}

/// Schedule catalog backed by a JSON array on disk
///
/// The file is read on every call so edits show up without a restart.
/// A missing file is an empty catalog.
#[derive(Debug, Clone)]
pub struct FileScheduleCatalog {
    path: PathBuf,
}

impl FileScheduleCatalog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ScheduleCatalog for FileScheduleCatalog {
    async fn list_schedules(&self) -> Result<Vec<ScheduleEntry>, Error> {
        if !self.path.exists() {
            tracing::debug!("Schedule file does not exist: {}", self.path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::persistence(format!(
                "Failed to read schedule file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            Error::persistence(format!(
                "Failed to parse schedule file {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

/// Schedule catalog with nothing in it
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyScheduleCatalog;

#[async_trait]
impl ScheduleCatalog for EmptyScheduleCatalog {
    async fn list_schedules(&self) -> Result<Vec<ScheduleEntry>, Error> {
        Ok(Vec::new())
    }
}
