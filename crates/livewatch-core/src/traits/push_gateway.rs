// # Push Gateway Trait
//
// Defines the interface for best-effort push delivery.
//
// ## Implementations
//
// - Firebase Cloud Messaging: `livewatch-push-fcm` crate
//
// ## Delivery Semantics
//
// Fire-and-forget. A gateway reports failure through its `Result`, and the
// caller logs and discards it. Nothing in livewatch retries a delivery.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Topic announcing that a stream started
pub const TOPIC_LIVE_START: &str = "live_start";

/// Topic announcing that a stream ended
pub const TOPIC_LIVE_END: &str = "live_end";

/// Data key carrying the notification kind
pub const DATA_KEY_TYPE: &str = "type";

/// Data key carrying the client click action
pub const DATA_KEY_CLICK_ACTION: &str = "click_action";

/// Click action understood by the mobile client
pub const CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";

/// Where a push message goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PushTarget {
    /// Named broadcast topic
    Topic(String),
    /// Single device registration token
    Token(String),
}

/// A push notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub target: PushTarget,
    pub title: String,
    pub body: String,
    /// Notification kind; when set, a data payload is attached
    pub kind: Option<String>,
}

impl PushMessage {
    /// A message to a topic
    pub fn to_topic(
        topic: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            target: PushTarget::Topic(topic.into()),
            title: title.into(),
            body: body.into(),
            kind: None,
        }
    }

    /// A message to a single device
    pub fn to_token(
        token: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            target: PushTarget::Token(token.into()),
            title: title.into(),
            body: body.into(),
            kind: None,
        }
    }

    /// Tag the message with a kind
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Topic name, if the message targets one
    pub fn topic(&self) -> Option<&str> {
        match &self.target {
            PushTarget::Topic(topic) => Some(topic),
            PushTarget::Token(_) => None,
        }
    }

    /// Data payload delivered alongside the notification
    pub fn data(&self) -> Option<BTreeMap<String, String>> {
        let kind = self.kind.as_ref()?;
        let mut data = BTreeMap::new();
        data.insert(DATA_KEY_TYPE.to_string(), kind.clone());
        data.insert(DATA_KEY_CLICK_ACTION.to_string(), CLICK_ACTION.to_string());
        Some(data)
    }
}

/// Receipt for an accepted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Gateway-assigned message id
    pub message_id: String,
}

/// Trait for push gateway implementations
///
/// # Contract
///
/// - One delivery attempt per call; no retry, no backoff
/// - Failures are returned as [`Error::DeliveryFailed`](crate::Error::DeliveryFailed)
/// - Credentials never appear in logs or `Debug` output
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Attempt delivery of one message
    ///
    /// # Returns
    ///
    /// - `Ok(DeliveryReceipt)`: Accepted by the gateway
    /// - `Err(Error::DeliveryFailed)`: Rejected or unreachable
    async fn send(&self, message: &PushMessage) -> Result<DeliveryReceipt, crate::Error>;

    /// Gateway name (for logging)
    fn gateway_name(&self) -> &'static str;
}

/// Send a message and discard any failure after logging it
///
/// Returns whether the gateway accepted the message.
pub async fn dispatch(gateway: &dyn PushGateway, message: &PushMessage) -> bool {
    match gateway.send(message).await {
        Ok(receipt) => {
            tracing::debug!(
                "Push accepted by {} (message_id={})",
                gateway.gateway_name(),
                receipt.message_id
            );
            true
        }
        Err(e) => {
            tracing::warn!("Push to {:?} dropped: {}", message.target, e);
            false
        }
    }
}
