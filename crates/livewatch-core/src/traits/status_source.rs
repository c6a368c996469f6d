// # Status Source Trait
//
// Defines the interface for fetching the current broadcast status from the
// external, rate-limited status API.
//
// ## Implementations
//
// - Chzzk: `livewatch-source-chzzk` crate
//
// ## Usage
//
// ```rust,ignore
// use livewatch_core::StatusSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* StatusSource implementation */;
//
//     let status = source.fetch_status().await?;
//     if status.is_live() {
//         let thumbnail = source.fetch_thumbnail().await.ok().flatten();
//         println!("live: {:?} ({:?})", status.title, thumbnail);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::model::LiveStatus;

/// Trait for external status source implementations
///
/// # Contract
///
/// - One outbound request per call, no internal retries
/// - No caching beyond a single request
/// - Every failure of [`fetch_status`](StatusSource::fetch_status) is reported as
///   [`Error::SourceUnavailable`](crate::Error::SourceUnavailable)
/// - Every failure of [`fetch_thumbnail`](StatusSource::fetch_thumbnail) is reported as
///   [`Error::DetailUnavailable`](crate::Error::DetailUnavailable)
///
/// Deciding what a status change means is owned by the
/// [`TransitionDetector`](crate::TransitionDetector), never by the source.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch and normalize the current status
    ///
    /// # Returns
    ///
    /// - `Ok(LiveStatus)`: The normalized status (not yet thumbnail-enriched)
    /// - `Err(Error::SourceUnavailable)`: Transport error, timeout, non-2xx,
    ///   unparseable or malformed body
    async fn fetch_status(&self) -> Result<LiveStatus, crate::Error>;

    /// Fetch the stream thumbnail from the detail endpoint
    ///
    /// Only called while live. Callers swallow failures.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(url))`: Thumbnail URL
    /// - `Ok(None)`: Detail fetched but carries no thumbnail
    /// - `Err(Error::DetailUnavailable)`: Detail request failed
    async fn fetch_thumbnail(&self) -> Result<Option<String>, crate::Error>;

    /// Thumbnail to use when the detail endpoint yields none
    fn fallback_thumbnail(&self) -> Option<String> {
        None
    }

    /// Source name (for logging)
    fn source_name(&self) -> &'static str;
}
