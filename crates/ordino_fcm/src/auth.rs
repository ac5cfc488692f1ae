//! Authentication for Firebase Cloud Messaging
//!
//! This module mints the short-lived OAuth2 bearer tokens that authorize
//! calls to the FCM HTTP v1 API. A service-account assertion is signed with
//! RS256 and exchanged at the OAuth token endpoint via the jwt-bearer grant.
//!
//! The minted token is cached with its expiry and only re-minted when it is
//! inside the safety leeway of expiring, so a dispatch can never start with
//! a token that dies mid-batch.

use crate::error::NotifyError;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ordino_common::services::{AccessToken, AccessTokenIssuer, BoxFuture};
use ordino_common::HTTP_CLIENT;
use ordino_config::{env_vars, FcmConfig};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

/// Scope authorizing FCM sends.
pub const MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

/// Google's OAuth2 token endpoint, used when the config has no override.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// A cached token with less remaining life than this is re-minted.
const EXPIRY_LEEWAY_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Issues FCM bearer tokens on behalf of a service account.
pub struct ServiceAccountIssuer {
    client_email: String,
    encoding_key: EncodingKey,
    token_uri: String,
    cached: Mutex<Option<AccessToken>>,
}

impl ServiceAccountIssuer {
    /// Create an issuer from the FCM config and a PKCS#8 RSA private key in
    /// PEM form. Literal `\n` sequences in the key (secret-manager
    /// convention) are normalized before parsing.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the client email is missing or the key
    /// does not parse. Both are startup-time failures.
    pub fn new(config: &FcmConfig, private_key_pem: &str) -> Result<Self, NotifyError> {
        let client_email = config
            .client_email
            .clone()
            .ok_or_else(|| NotifyError::ConfigError("Missing client_email in FcmConfig".to_string()))?;

        let pem = private_key_pem.replace("\\n", "\n");
        let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
            NotifyError::ConfigError(format!("Invalid service-account private key: {}", e))
        })?;

        let token_uri = config
            .token_uri
            .clone()
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());

        Ok(Self {
            client_email,
            encoding_key,
            token_uri,
            cached: Mutex::new(None),
        })
    }

    /// Create an issuer reading the private key from `FIREBASE_PRIVATE_KEY`.
    pub fn from_env(config: &FcmConfig) -> Result<Self, NotifyError> {
        let key = env_vars::firebase_private_key().ok_or_else(|| {
            NotifyError::ConfigError(format!("{} is not set", env_vars::FIREBASE_PRIVATE_KEY))
        })?;
        Self::new(config, &key)
    }

    async fn mint(&self) -> Result<AccessToken, NotifyError> {
        let now = Utc::now();
        let claims = Claims {
            iss: &self.client_email,
            scope: MESSAGING_SCOPE,
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(TOKEN_LIFETIME_SECS)).timestamp(),
        };

        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| NotifyError::AuthFailure(format!("Failed to sign assertion: {}", e)))?;

        let response = HTTP_CLIENT
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .send()
            .await
            .map_err(|e| NotifyError::AuthFailure(format!("Token exchange request failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NotifyError::AuthFailure(format!(
                "OAuth2 token exchange failed: {}",
                error_text
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            NotifyError::AuthFailure(format!("Malformed token response: {}", e))
        })?;

        debug!("Access token obtained");
        Ok(AccessToken {
            token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in.unwrap_or(TOKEN_LIFETIME_SECS)),
        })
    }
}

impl AccessTokenIssuer for ServiceAccountIssuer {
    type Error = NotifyError;

    fn bearer_token(&self) -> BoxFuture<'_, AccessToken, Self::Error> {
        Box::pin(async move {
            let mut cached = self.cached.lock().await;
            if let Some(token) = cached.as_ref() {
                if token.is_fresh(EXPIRY_LEEWAY_SECS) {
                    return Ok(token.clone());
                }
            }

            let token = self.mint().await?;
            *cached = Some(token.clone());
            Ok(token)
        })
    }
}
