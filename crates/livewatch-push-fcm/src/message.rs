//! FCM HTTP v1 request body

use std::collections::BTreeMap;

use livewatch_core::traits::{PushMessage, PushTarget};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct FcmRequest<'a> {
    pub message: FcmMessage<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FcmMessage<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<&'a str>,
    pub notification: FcmNotification<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FcmNotification<'a> {
    pub title: &'a str,
    pub body: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FcmResponse {
    /// `projects/{project}/messages/{id}`
    #[serde(default)]
    pub name: Option<String>,
}

impl<'a> From<&'a PushMessage> for FcmRequest<'a> {
    fn from(message: &'a PushMessage) -> Self {
        let (token, topic) = match &message.target {
            PushTarget::Token(token) => (Some(token.as_str()), None),
            PushTarget::Topic(topic) => (None, Some(topic.as_str())),
        };

        FcmRequest {
            message: FcmMessage {
                token,
                topic,
                notification: FcmNotification {
                    title: &message.title,
                    body: &message.body,
                },
                data: message.data(),
            },
        }
    }
}
