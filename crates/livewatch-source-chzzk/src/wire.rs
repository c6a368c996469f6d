//! Chzzk wire types and their normalization
//!
//! Every payload arrives in an envelope `{ "code", "message", "content" }`.
//! Unknown fields are ignored.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use livewatch_core::{Error, LiveState, LiveStatus, ReplayEntry, Result};
use serde::{Deserialize, Deserializer};

/// Format of `openDate`, in Korea Standard Time
const OPEN_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Korea Standard Time offset in seconds
const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Placeholder in `liveImageUrl` that selects the image size
const IMAGE_TYPE_PLACEHOLDER: &str = "{type}";

/// Image size requested for thumbnails
const IMAGE_TYPE: &str = "720";

const VIDEO_URL_BASE: &str = "https://chzzk.naver.com/video";

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    pub content: Option<T>,
}

impl<T> Envelope<T> {
    /// The content, or a malformed-response description
    pub fn into_content(self) -> std::result::Result<T, String> {
        self.content.ok_or_else(|| {
            format!(
                "malformed response: no content (code={:?}, message={:?})",
                self.code, self.message
            )
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LiveStatusContent {
    #[serde(default, deserialize_with = "string_or_number")]
    pub live_id: Option<String>,
    #[serde(default)]
    pub live_title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub concurrent_user_count: Option<u64>,
    #[serde(default)]
    pub open_date: Option<String>,
    #[serde(default)]
    pub live_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LiveDetailContent {
    #[serde(default)]
    pub live_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoPage {
    #[serde(default)]
    pub data: Vec<Video>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Video {
    #[serde(default)]
    pub video_no: Option<i64>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub video_id: Option<String>,
    #[serde(default)]
    pub video_title: Option<String>,
    #[serde(default)]
    pub thumbnail_image_url: Option<String>,
    #[serde(default)]
    pub read_count: Option<u64>,
    #[serde(default)]
    pub publish_date: Option<String>,
}

/// Accept an id sent either as a JSON string or a JSON number
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

impl LiveStatusContent {
    /// Normalize into a [`LiveStatus`] for `channel_id`
    pub fn into_status(self, channel_id: &str) -> Result<LiveStatus> {
        let state = match self.status.as_deref() {
            Some("OPEN") => LiveState::Live,
            Some("CLOSE") => LiveState::Offline,
            other => {
                return Err(Error::source_unavailable(format!(
                    "malformed response: unknown live status {:?}",
                    other
                )));
            }
        };

        let opened_at = self.open_date.as_deref().and_then(parse_open_date);
        let thumbnail_url = sized_image(self.live_image_url);

        Ok(LiveStatus {
            session_id: self.live_id,
            title: self.live_title,
            state,
            viewer_count: self.concurrent_user_count.unwrap_or(0),
            opened_at,
            thumbnail_url,
            channel_id: Some(channel_id.to_string()),
        })
    }
}

impl LiveDetailContent {
    /// The thumbnail URL with the size placeholder filled in
    pub fn thumbnail(self) -> Option<String> {
        sized_image(self.live_image_url)
    }
}

/// Fill the size placeholder of an image URL; empty URLs are absent
fn sized_image(url: Option<String>) -> Option<String> {
    url.filter(|url| !url.is_empty())
        .map(|url| url.replace(IMAGE_TYPE_PLACEHOLDER, IMAGE_TYPE))
}

impl Video {
    /// Project into a [`ReplayEntry`]; videos without any id are skipped
    pub fn into_entry(self) -> Option<ReplayEntry> {
        let path_id = match (self.video_no, &self.video_id) {
            (Some(no), _) => no.to_string(),
            (None, Some(id)) => id.clone(),
            (None, None) => return None,
        };
        let clip_id = self.video_id.unwrap_or_else(|| path_id.clone());

        Some(ReplayEntry {
            clip_id,
            title: self.video_title.unwrap_or_default(),
            video_url: format!("{}/{}", VIDEO_URL_BASE, path_id),
            thumbnail_url: self.thumbnail_image_url,
            view_count: self.read_count.unwrap_or(0),
            created_at: self.publish_date,
        })
    }
}

/// Parse a KST `openDate`; anything unparseable is simply absent
pub(crate) fn parse_open_date(raw: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), OPEN_DATE_FORMAT).ok()?;
    let kst = FixedOffset::east_opt(KST_OFFSET_SECS)?;
    kst.from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
}
