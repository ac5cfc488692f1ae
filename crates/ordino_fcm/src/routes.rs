use axum::{routing::post, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::handlers::{
    register_device_handler, remove_device_handler, send_order_notification_handler, NotifyState,
};

/// Create the notification routes for the API
///
/// Sets up the order trigger plus the device registration endpoints, with a
/// permissive CORS layer so the admin web frontend can call them directly.
pub fn routes(state: NotifyState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    info!("Notification routes initialized");

    Router::new()
        .route(
            "/notifications/send-order",
            post(send_order_notification_handler),
        )
        .route(
            "/notifications/register-device",
            post(register_device_handler),
        )
        .route("/notifications/remove-device", post(remove_device_handler))
        .layer(cors)
        .with_state(state)
}
