//! OAuth2 service-account flow
//!
//! A signed RS256 assertion is exchanged at the key's `token_uri` for a
//! short-lived access token. The token is cached until 60 s before expiry.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use livewatch_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::credentials::ServiceAccountKey;

/// Scope required to send FCM messages
const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Assertion lifetime
const ASSERTION_LIFETIME_MINUTES: i64 = 60;

/// A cached token is reused only while it has at least this much life left
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    access_token: String,
    expires_at: i64,
}

/// Issues and caches access tokens for one service account
pub(crate) struct TokenProvider {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    cache: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// Fails if the key's private key is not a usable RSA PEM
    pub fn new(key: ServiceAccountKey) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| Error::config(format!("Failed to parse private key: {}", e)))?;

        Ok(Self {
            key,
            encoding_key,
            cache: Mutex::new(None),
        })
    }

    pub fn key(&self) -> &ServiceAccountKey {
        &self.key
    }

    /// A valid access token, exchanging a fresh assertion when needed
    ///
    /// The cache lock is held across the exchange so concurrent senders
    /// share one token request.
    pub async fn access_token(&self, client: &reqwest::Client) -> Result<String> {
        let mut cache = self.cache.lock().await;

        let now = Utc::now().timestamp();
        if let Some(cached) = cache.as_ref()
            && cached.expires_at > now + EXPIRY_MARGIN_SECS
        {
            return Ok(cached.access_token.clone());
        }

        let assertion = self.sign_assertion()?;
        let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];

        let response = client
            .post(&self.key.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::delivery_failed("fcm", format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::delivery_failed(
                "fcm",
                format!("Token request failed with status: {}", response.status()),
            ));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            Error::delivery_failed("fcm", format!("Failed to parse token response: {}", e))
        })?;

        tracing::debug!("Obtained FCM access token (expires in {}s)", token.expires_in);

        let access_token = token.access_token.clone();
        *cache = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now().timestamp() + token.expires_in,
        });

        Ok(access_token)
    }

    fn sign_assertion(&self) -> Result<String> {
        let now = Utc::now();
        let claims = JwtClaims {
            iss: &self.key.client_email,
            sub: &self.key.client_email,
            scope: FCM_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::minutes(ASSERTION_LIFETIME_MINUTES)).timestamp(),
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| Error::delivery_failed("fcm", format!("Failed to sign assertion: {}", e)))
    }
}
