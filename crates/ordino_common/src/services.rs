//! Service abstractions for the notification pipeline.
//!
//! This module provides trait definitions for the external collaborators of
//! the pipeline: the durable token registry, the OAuth access-token issuer
//! and the per-device push sender. The traits allow dependency injection and
//! easier testing by decoupling the dispatcher from specific implementations.

use crate::models::{DeviceRegistration, OrderNotificationPayload};
use chrono::{DateTime, Utc};
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A wrapper error type that implements std::error::Error for Box<dyn std::error::Error + Send + Sync>
#[derive(Debug)]
pub struct BoxedError(pub Box<dyn StdError + Send + Sync>);

impl fmt::Display for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for BoxedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<Box<dyn StdError + Send + Sync>> for BoxedError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        BoxedError(err)
    }
}

impl From<String> for BoxedError {
    fn from(message: String) -> Self {
        BoxedError(message.into())
    }
}

/// A short-lived bearer credential for the push provider's send API.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Whether the token is still valid `leeway_secs` from now. A token
    /// inside the leeway window is treated as stale and re-minted.
    pub fn is_fresh(&self, leeway_secs: i64) -> bool {
        self.expires_at - chrono::Duration::seconds(leeway_secs) > Utc::now()
    }
}

/// The durable device → push token mapping.
///
/// All operations are reads/writes against the external data store; no
/// in-memory cache sits in front, so a refreshed token is visible to the
/// very next dispatch.
pub trait TokenRegistry: Send + Sync {
    /// Error type returned by registry operations.
    type Error: StdError + Send + Sync + 'static;

    /// Idempotent upsert keyed on the token. An existing row for the token
    /// has its owner, platform and updated-at overwritten, never duplicated.
    fn register(
        &self,
        registration: DeviceRegistration,
    ) -> BoxFuture<'_, DeviceRegistration, Self::Error>;

    /// Delete the registration for a token. Returns `false` (not an error)
    /// when no such token exists.
    fn remove(&self, token: &str) -> BoxFuture<'_, bool, Self::Error>;

    /// Every current registration. Zero rows produces an empty fan-out.
    fn list_all(&self) -> BoxFuture<'_, Vec<DeviceRegistration>, Self::Error>;
}

/// Issues bearer credentials authorizing calls to the push provider.
pub trait AccessTokenIssuer: Send + Sync {
    /// Error type returned when minting fails.
    type Error: StdError + Send + Sync + 'static;

    /// Produce a bearer token valid for at least the duration of one
    /// dispatch cycle.
    fn bearer_token(&self) -> BoxFuture<'_, AccessToken, Self::Error>;
}

/// A failed per-device send.
///
/// `permanent` marks rejections that indicate the token itself is dead
/// (uninstalled app, expired registration) rather than a transient provider
/// problem; the dispatcher feeds those to its invalid-token hook.
#[derive(Debug)]
pub struct PushSendError {
    pub message: String,
    pub permanent: bool,
}

impl fmt::Display for PushSendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for PushSendError {}

/// Sends one push message to one device.
pub trait PushSender: Send + Sync {
    /// Deliver the order payload to the device identified by `token`,
    /// authorized by `bearer`. Returns the provider message id.
    fn send(
        &self,
        token: &str,
        bearer: &str,
        payload: &OrderNotificationPayload,
    ) -> BoxFuture<'_, String, PushSendError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn access_token_freshness_respects_leeway() {
        let token = AccessToken {
            token: "t".to_string(),
            expires_at: Utc::now() + Duration::seconds(30),
        };
        assert!(token.is_fresh(0));
        // 30 s of remaining life is inside a 60 s leeway window.
        assert!(!token.is_fresh(60));
    }
}
