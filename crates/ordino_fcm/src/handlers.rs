//! HTTP handlers for the order-notification endpoints
//!
//! This module provides the Axum handlers behind the notification API: the
//! order trigger that fans out to every registered device, plus device
//! registration and removal. Request and response types live here too and
//! carry OpenAPI annotations when the `openapi` feature is enabled.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use ordino_common::models::{DeviceRegistration, OrderNotificationPayload};
use ordino_common::services::{BoxedError, TokenRegistry};

use crate::dispatch::{token_prefix, Dispatcher};
use crate::error::NotifyError;

/// Shared state for the notification handlers
#[derive(Clone)]
pub struct NotifyState {
    /// Fan-out dispatcher for order triggers
    pub dispatcher: Arc<Dispatcher>,

    /// Durable device registry
    pub registry: Arc<dyn TokenRegistry<Error = BoxedError>>,
}

/// Response body for the order trigger endpoint
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SendOrderResponse {
    /// Human-readable outcome line
    pub message: String,

    /// Devices that accepted the message
    pub success: usize,

    /// Devices that rejected it
    pub failed: usize,

    /// Devices the batch targeted
    pub total_devices: usize,
}

/// Error body returned with a 500
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    /// Stable error line
    pub error: String,

    /// Failure detail from the underlying component
    pub details: String,
}

/// Request body for registering a device token
#[derive(Debug, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegisterDeviceRequest {
    /// The FCM registration token of the device
    pub fcm_token: String,

    /// The owning user, if the client is signed in
    pub user_id: Option<String>,

    /// Platform tag ("android", "ios", "web")
    pub platform: Option<String>,
}

/// Response body for the register/remove endpoints
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DeviceResponse {
    /// Whether the operation changed the registry
    pub success: bool,

    /// Human-readable outcome line
    pub message: String,
}

/// Request body for removing a device token
#[derive(Debug, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RemoveDeviceRequest {
    /// The FCM registration token to delete
    pub fcm_token: String,
}

fn error_response(error: &str, details: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: error.to_string(),
            details,
        }),
    )
        .into_response()
}

/// Handler for sending an order notification to every registered device
///
/// Returns 200 with the batch tally on any completed batch, including the
/// empty one; 500 with `{error, details}` when the payload is invalid or no
/// bearer token could be minted.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/notifications/send-order",
    request_body = OrderNotificationPayload,
    responses(
        (status = 200, description = "Batch completed", body = SendOrderResponse),
        (status = 500, description = "Batch aborted", body = ErrorResponse)
    ),
    tag = "notifications"
))]
pub async fn send_order_notification_handler(
    State(state): State<NotifyState>,
    Json(payload): Json<OrderNotificationPayload>,
) -> Response {
    match state.dispatcher.dispatch_order(&payload).await {
        Ok(summary) => {
            let message = if summary.total_devices == 0 {
                "No devices to notify".to_string()
            } else {
                "Notifications sent".to_string()
            };
            (
                StatusCode::OK,
                Json(SendOrderResponse {
                    message,
                    success: summary.success,
                    failed: summary.failed,
                    total_devices: summary.total_devices,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Order dispatch failed: {}", e);
            error_response("Failed to send notifications", e.to_string())
        }
    }
}

/// Handler for registering a device token
///
/// The upsert is keyed on the token, so re-registering a token the registry
/// already holds rewrites its row instead of duplicating it.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/notifications/register-device",
    request_body = RegisterDeviceRequest,
    responses(
        (status = 200, description = "Device registered", body = DeviceResponse),
        (status = 500, description = "Registration failed", body = ErrorResponse)
    ),
    tag = "notifications"
))]
pub async fn register_device_handler(
    State(state): State<NotifyState>,
    Json(request): Json<RegisterDeviceRequest>,
) -> Response {
    if request.fcm_token.is_empty() {
        return error_response(
            "Failed to register device",
            NotifyError::InvalidPayload("fcm_token is required".to_string()).to_string(),
        );
    }

    let registration =
        DeviceRegistration::new(request.fcm_token, request.user_id, request.platform);

    match state.registry.register(registration).await {
        Ok(saved) => {
            info!("Registered device {}", token_prefix(&saved.fcm_token));
            (
                StatusCode::OK,
                Json(DeviceResponse {
                    success: true,
                    message: "Device registered".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Device registration failed: {}", e);
            error_response("Failed to register device", e.to_string())
        }
    }
}

/// Handler for removing a device token
///
/// Removing a token the registry does not hold is a no-op success.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/notifications/remove-device",
    request_body = RemoveDeviceRequest,
    responses(
        (status = 200, description = "Device removed (or was absent)", body = DeviceResponse),
        (status = 500, description = "Removal failed", body = ErrorResponse)
    ),
    tag = "notifications"
))]
pub async fn remove_device_handler(
    State(state): State<NotifyState>,
    Json(request): Json<RemoveDeviceRequest>,
) -> Response {
    match state.registry.remove(&request.fcm_token).await {
        Ok(removed) => {
            info!(
                "Remove device {}: existed = {}",
                token_prefix(&request.fcm_token),
                removed
            );
            let message = if removed {
                "Device removed".to_string()
            } else {
                "Device was not registered".to_string()
            };
            (
                StatusCode::OK,
                Json(DeviceResponse {
                    success: true,
                    message,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Device removal failed: {}", e);
            error_response("Failed to remove device", e.to_string())
        }
    }
}
