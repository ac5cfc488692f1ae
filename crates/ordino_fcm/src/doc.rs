use utoipa::OpenApi;

use crate::client::{AndroidConfig, AndroidNotification, FcmMessage, Message, Notification};
use crate::dispatch::DispatchSummary;
use crate::handlers::{
    DeviceResponse, ErrorResponse, RegisterDeviceRequest, RemoveDeviceRequest, SendOrderResponse,
};
use ordino_common::models::OrderNotificationPayload;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::send_order_notification_handler,
        crate::handlers::register_device_handler,
        crate::handlers::remove_device_handler,
    ),
    components(
        schemas(
            OrderNotificationPayload,
            SendOrderResponse,
            ErrorResponse,
            RegisterDeviceRequest,
            RemoveDeviceRequest,
            DeviceResponse,
            DispatchSummary,
            FcmMessage,
            Message,
            Notification,
            AndroidConfig,
            AndroidNotification,
        )
    ),
    tags(
        (name = "notifications", description = "Order notification API")
    ),
    servers(
        (url = "/api", description = "Order notification API server")
    )
)]
pub struct NotifyApiDoc;
