// # FCM Push Gateway
//
// This crate provides the Push Gateway for livewatch, backed by the Firebase
// Cloud Messaging HTTP v1 API.
//
// ## Delivery Semantics
//
// - One HTTP request per message (plus a token exchange when the cached
//   access token is missing or about to expire)
// - Failures are returned as `Error::DeliveryFailed`; the caller logs and
//   discards them
// - No retries, no backoff, no background tasks
// - 30 second timeout on every request
//
// ## Security Requirements
//
// - The service-account private key and access tokens NEVER appear in logs
// - Debug output is redacted
//
// ## API Reference
//
// - Send: POST `/v1/projects/{project_id}/messages:send`
// - Token: POST `{token_uri}` with a JWT bearer assertion

mod auth;
mod credentials;
mod message;

use std::time::Duration;

use async_trait::async_trait;
use livewatch_core::config::PushConfig;
use livewatch_core::traits::{DeliveryReceipt, PushGateway, PushMessage};
use livewatch_core::{Error, Result};

use crate::auth::TokenProvider;
use crate::message::{FcmRequest, FcmResponse};

pub use crate::credentials::ServiceAccountKey;

/// FCM API base URL
pub const FCM_API_BASE: &str = "https://fcm.googleapis.com";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Receipt id reported for messages that were only logged
const DRY_RUN_MESSAGE_ID: &str = "dry-run";

/// Firebase Cloud Messaging gateway
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the gateway will:
/// - Log the request body it would have sent
/// - Report success
/// - Perform **no** network I/O (not even the token exchange)
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose credentials.
pub struct FcmPushGateway {
    /// Token issuer; absent only in dry-run mode without a key
    auth: Option<TokenProvider>,

    /// API base URL without trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, log messages instead of sending them
    dry_run: bool,
}

impl std::fmt::Debug for FcmPushGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FcmPushGateway")
            .field("project_id", &self.project_id())
            .field("credentials", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl FcmPushGateway {
    /// Create a gateway that delivers for real
    pub fn new_live(key: ServiceAccountKey) -> Result<Self> {
        Self::build(Some(key), false)
    }

    /// Create a gateway that only logs what it would send
    pub fn new_dry_run(key: Option<ServiceAccountKey>) -> Result<Self> {
        Self::build(key, true)
    }

    fn build(key: Option<ServiceAccountKey>, dry_run: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let auth = key.map(TokenProvider::new).transpose()?;

        Ok(Self {
            auth,
            api_base: FCM_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Create a gateway from configuration, loading the key file if one is set
    pub async fn from_config(config: &PushConfig) -> Result<Self> {
        config.validate()?;

        match config {
            PushConfig::Fcm {
                credentials_path,
                dry_run,
            } => {
                let key = match credentials_path.as_deref().filter(|p| !p.is_empty()) {
                    Some(path) => Some(ServiceAccountKey::from_file(path).await?),
                    None => None,
                };

                match (key, *dry_run) {
                    (key, true) => Self::new_dry_run(key),
                    (Some(key), false) => Self::new_live(key),
                    (None, false) => Err(Error::config(
                        "FCM credentials are required unless dry-run is enabled",
                    )),
                }
            }
        }
    }

    /// Point the gateway at a different API host
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether messages are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn project_id(&self) -> Option<&str> {
        self.auth.as_ref().map(|auth| auth.key().project_id.as_str())
    }

    async fn deliver(&self, auth: &TokenProvider, request: &FcmRequest<'_>) -> Result<DeliveryReceipt> {
        let access_token = auth.access_token(&self.client).await?;

        let url = format!(
            "{}/v1/projects/{}/messages:send",
            self.api_base,
            auth.key().project_id
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&access_token)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::delivery_failed("fcm", format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            let message = match status.as_u16() {
                401 | 403 => format!(
                    "Authentication failed: credentials rejected. Status: {}",
                    status
                ),
                404 => format!("Target not registered: {} - {}", status, error_text),
                429 => format!("Quota exceeded. Status: {}", status),
                500..=599 => format!("FCM server error: {} - {}", status, error_text),
                _ => format!("Send failed: {} - {}", status, error_text),
            };
            return Err(Error::delivery_failed("fcm", message));
        }

        let body: FcmResponse = response
            .json()
            .await
            .map_err(|e| Error::delivery_failed("fcm", format!("Failed to parse response: {}", e)))?;

        Ok(DeliveryReceipt {
            message_id: body.name.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl PushGateway for FcmPushGateway {
    async fn send(&self, message: &PushMessage) -> Result<DeliveryReceipt> {
        let request = FcmRequest::from(message);

        if self.dry_run {
            let body = serde_json::to_string(&request)?;
            tracing::info!("[DRY-RUN] Would send FCM message: {}", body);
            return Ok(DeliveryReceipt {
                message_id: DRY_RUN_MESSAGE_ID.to_string(),
            });
        }

        let auth = self
            .auth
            .as_ref()
            .ok_or_else(|| Error::delivery_failed("fcm", "No credentials configured"))?;

        let receipt = self.deliver(auth, &request).await?;
        tracing::debug!("FCM accepted message {}", receipt.message_id);
        Ok(receipt)
    }

    fn gateway_name(&self) -> &'static str {
        "fcm"
    }
}
