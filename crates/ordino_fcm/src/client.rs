//! Firebase Cloud Messaging client module
//!
//! This module provides a client for the FCM HTTP v1 API, shaped for one
//! job: delivering the new-order alert to a single device token with the
//! delivery hints that keep it loud and persistent on the operator's phone
//! (high priority, default sound, the order notification channel, sticky).

use ordino_common::models::OrderNotificationPayload;
use ordino_common::services::{BoxFuture, PushSendError, PushSender};
use ordino_common::create_client;
use ordino_config::FcmConfig;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::NotifyError;

/// FCM API base URL, used when the config has no override.
pub const DEFAULT_API_BASE: &str = "https://fcm.googleapis.com";

/// Android notification channel the admin app registers for order alerts.
pub const ORDER_CHANNEL_ID: &str = "order_notifications";

const NOTIFICATION_TITLE: &str = "🍕 Nuovo Ordine!";

/// Per-send timeout. A hung provider connection counts as one per-device
/// failure, never a stalled batch.
const SEND_TIMEOUT_SECS: u64 = 5;

/// A message to be sent via Firebase Cloud Messaging
///
/// Top-level wrapper matching the FCM HTTP v1 API format.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FcmMessage {
    /// The message payload
    pub message: Message,
}

/// The message payload for Firebase Cloud Messaging
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Message {
    /// Registration token of the target device
    pub token: String,

    /// The notification displayed on the device
    pub notification: Notification,

    /// Custom key-value data delivered alongside the notification; every
    /// order payload field travels here as a string
    pub data: HashMap<String, String>,

    /// Android-specific delivery hints
    pub android: AndroidConfig,
}

/// The notification block displayed on the device
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Notification {
    /// The title of the notification
    pub title: String,

    /// The body text of the notification
    pub body: String,
}

/// Android delivery configuration for the order alert
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AndroidConfig {
    pub priority: String,
    pub notification: AndroidNotification,
}

/// Android notification hints; field names follow the FCM JSON mapping
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AndroidNotification {
    pub sound: String,
    pub channel_id: String,
    pub priority: String,
    pub default_vibrate_timings: bool,
    /// The notification stays until the operator interacts with it
    pub sticky: bool,
}

/// Response from the FCM API after a successful send
#[derive(Debug, Deserialize)]
pub struct FcmResponse {
    /// "projects/{project_id}/messages/{message_id}"
    pub name: String,
}

/// Client for the Firebase Cloud Messaging HTTP v1 API
pub struct FcmClient {
    /// HTTP client for requests to the FCM API
    client: Client,

    /// Firebase project identifier
    project_id: String,

    /// API base URL (overridable for tests)
    api_base: String,
}

impl FcmClient {
    /// Creates a new FCM client from the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the project id is missing.
    pub fn new(config: &FcmConfig) -> Result<Self, NotifyError> {
        let project_id = config
            .project_id
            .clone()
            .ok_or_else(|| NotifyError::ConfigError("Missing project_id in FcmConfig".to_string()))?;

        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let client = create_client(SEND_TIMEOUT_SECS, true)?;

        Ok(Self {
            client,
            project_id,
            api_base,
        })
    }

    /// Build the order-alert message for one device token.
    ///
    /// The notification templates are fixed; the data map carries every
    /// payload field as a string, defensively defaulted, plus any extension
    /// fields the trigger sent.
    pub fn order_message(token: &str, payload: &OrderNotificationPayload) -> FcmMessage {
        let mut data: HashMap<String, String> = payload.extra.clone();
        data.insert("order_id".to_string(), payload.order_id.clone());
        data.insert("order_number".to_string(), payload.order_number.clone());
        data.insert("customer_name".to_string(), payload.customer_name.clone());
        data.insert("total_amount".to_string(), payload.total_amount.clone());
        data.insert("order_type".to_string(), payload.order_type.clone());
        data.insert(
            "payment_method".to_string(),
            payload.payment_method.clone().unwrap_or_default(),
        );
        data.insert("created_at".to_string(), payload.created_at.clone());
        data.insert("type".to_string(), payload.event_type.clone());

        FcmMessage {
            message: Message {
                token: token.to_string(),
                notification: Notification {
                    title: NOTIFICATION_TITLE.to_string(),
                    body: format!("Ordine {} - {}", payload.order_number, payload.customer_name),
                },
                data,
                android: AndroidConfig {
                    priority: "high".to_string(),
                    notification: AndroidNotification {
                        sound: "default".to_string(),
                        channel_id: ORDER_CHANNEL_ID.to_string(),
                        priority: "high".to_string(),
                        default_vibrate_timings: true,
                        sticky: true,
                    },
                },
            },
        }
    }

    /// Send one message, authorized by `bearer`.
    ///
    /// Failures are per-device: HTTP 404/410 mark the token permanently
    /// invalid, everything else (including timeouts) is transient.
    pub async fn send_message(
        &self,
        message: FcmMessage,
        bearer: &str,
    ) -> Result<String, PushSendError> {
        let url = format!(
            "{}/v1/projects/{}/messages:send",
            self.api_base, self.project_id
        );

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
            .json(&message)
            .send()
            .await
            .map_err(|e| PushSendError {
                message: format!("FCM request failed: {}", e),
                permanent: false,
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PushSendError {
                message: format!("FCM API error ({}): {}", status, error_text),
                permanent: matches!(status, StatusCode::NOT_FOUND | StatusCode::GONE),
            });
        }

        let fcm_response: FcmResponse = response.json().await.map_err(|e| PushSendError {
            message: format!("Malformed FCM response: {}", e),
            permanent: false,
        })?;

        Ok(fcm_response.name)
    }
}

impl PushSender for FcmClient {
    fn send(
        &self,
        token: &str,
        bearer: &str,
        payload: &OrderNotificationPayload,
    ) -> BoxFuture<'_, String, PushSendError> {
        let message = Self::order_message(token, payload);
        let bearer = bearer.to_string();
        Box::pin(async move { self.send_message(message, &bearer).await })
    }
}
