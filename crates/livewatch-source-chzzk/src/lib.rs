// # Chzzk Status Source
//
// This crate provides the External Status Source for livewatch, backed by the
// Chzzk JSON API.
//
// ## Endpoints
//
// - Status: `GET {api_base}/polling/v2/channels/{channel_id}/live-status`
// - Detail: `GET {api_base}/service/v2/channels/{channel_id}/live-detail`
// - Replays: `GET {api_base}/service/v1/channels/{channel_id}/videos?sortType=LATEST`
//
// ## Request Policy
//
// - Every request carries `User-Agent: Mozilla/5.0`
// - Every request is bounded by the configured timeout (10 s by default)
// - One request per call, no retries, no caching

mod wire;

use std::time::Duration;

use livewatch_core::config::SourceConfig;
use livewatch_core::traits::StatusSource;
use livewatch_core::{Error, LiveStatus, ReplayCatalog, ReplayEntry, Result};
use serde::de::DeserializeOwned;

use crate::wire::{Envelope, LiveDetailContent, LiveStatusContent, Video, VideoPage};

/// Public Chzzk API base URL
pub const DEFAULT_API_BASE: &str = "https://api.chzzk.naver.com";

/// Identifying header sent with every request
const USER_AGENT: &str = "Mozilla/5.0";

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Thumbnail host used when the detail endpoint yields none
const FALLBACK_THUMBNAIL_BASE: &str = "https://livecloud-thumb.akamaized.net/chzzk";

/// Status source backed by the Chzzk API
#[derive(Debug, Clone)]
pub struct ChzzkStatusSource {
    /// Channel every URL is built for
    channel_id: String,

    /// API base URL without trailing slash
    api_base: String,

    /// HTTP client
    client: reqwest::Client,
}

impl ChzzkStatusSource {
    /// Create a source for `channel_id` against the public API
    pub fn new(channel_id: impl Into<String>) -> Result<Self> {
        Self::with_options(
            channel_id,
            DEFAULT_API_BASE,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create a source with an explicit API base and timeout
    pub fn with_options(
        channel_id: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let channel_id = channel_id.into();
        if channel_id.trim().is_empty() {
            return Err(Error::config("Channel id cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            channel_id,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a source from configuration
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        config.validate()?;

        match config {
            SourceConfig::Chzzk {
                channel_id,
                api_base,
                timeout_secs,
            } => Self::with_options(
                channel_id.as_str(),
                api_base.as_deref().unwrap_or(DEFAULT_API_BASE),
                Duration::from_secs(*timeout_secs),
            ),
        }
    }

    /// The channel this source watches
    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    fn status_url(&self) -> String {
        format!(
            "{}/polling/v2/channels/{}/live-status",
            self.api_base, self.channel_id
        )
    }

    fn detail_url(&self) -> String {
        format!(
            "{}/service/v2/channels/{}/live-detail",
            self.api_base, self.channel_id
        )
    }

    fn videos_url(&self) -> String {
        format!(
            "{}/service/v1/channels/{}/videos?sortType=LATEST",
            self.api_base, self.channel_id
        )
    }

    /// GET `url` and unwrap the envelope's content
    ///
    /// Every failure is described as a plain message; callers pick the error kind.
    async fn get_content<T: DeserializeOwned>(&self, url: &str) -> std::result::Result<T, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("HTTP error: {}", response.status()));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse response: {}", e))?;

        envelope.into_content()
    }
}

#[async_trait::async_trait]
impl StatusSource for ChzzkStatusSource {
    async fn fetch_status(&self) -> Result<LiveStatus> {
        let content: LiveStatusContent = self
            .get_content(&self.status_url())
            .await
            .map_err(Error::source_unavailable)?;

        let status = content.into_status(&self.channel_id)?;
        tracing::debug!(
            "Channel {} is {} (session={:?})",
            self.channel_id,
            status.state,
            status.session_id
        );
        Ok(status)
    }

    async fn fetch_thumbnail(&self) -> Result<Option<String>> {
        let content: LiveDetailContent = self
            .get_content(&self.detail_url())
            .await
            .map_err(Error::detail_unavailable)?;

        Ok(content.thumbnail())
    }

    fn fallback_thumbnail(&self) -> Option<String> {
        Some(format!(
            "{}/{}_720.jpg",
            FALLBACK_THUMBNAIL_BASE, self.channel_id
        ))
    }

    fn source_name(&self) -> &'static str {
        "chzzk"
    }
}

#[async_trait::async_trait]
impl ReplayCatalog for ChzzkStatusSource {
    async fn list_replays(&self) -> Vec<ReplayEntry> {
        match self.get_content::<VideoPage>(&self.videos_url()).await {
            Ok(page) => page.data.into_iter().filter_map(Video::into_entry).collect(),
            Err(e) => {
                tracing::warn!("Replay listing failed for {}: {}", self.channel_id, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_built_from_channel_id() {
        let source = ChzzkStatusSource::with_options(
            "abc123",
            "http://localhost:9000/",
            Duration::from_secs(1),
        )
        .unwrap();

        assert_eq!(
            source.status_url(),
            "http://localhost:9000/polling/v2/channels/abc123/live-status"
        );
        assert_eq!(
            source.detail_url(),
            "http://localhost:9000/service/v2/channels/abc123/live-detail"
        );
        assert_eq!(
            source.videos_url(),
            "http://localhost:9000/service/v1/channels/abc123/videos?sortType=LATEST"
        );
        assert_eq!(
            source.fallback_thumbnail().as_deref(),
            Some("https://livecloud-thumb.akamaized.net/chzzk/abc123_720.jpg")
        );
    }

    #[test]
    fn from_config_rejects_empty_channel() {
        let config = SourceConfig::Chzzk {
            channel_id: " ".to_string(),
            api_base: None,
            timeout_secs: 10,
        };
        assert!(ChzzkStatusSource::from_config(&config).is_err());
    }

    #[test]
    fn from_config_uses_public_api_by_default() {
        let config = SourceConfig::Chzzk {
            channel_id: "abc123".to_string(),
            api_base: None,
            timeout_secs: 10,
        };
        let source = ChzzkStatusSource::from_config(&config).unwrap();
        assert!(source.status_url().starts_with(DEFAULT_API_BASE));
        assert_eq!(source.channel_id(), "abc123");
    }
}
